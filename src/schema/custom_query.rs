use crate::error::{Result, SchemaqlError};
use crate::types::{Context, Field, FieldDecl, SqlValue};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomQueryKind {
    /// Returns rows keyed by the declared column names.
    #[default]
    Select,
    /// Returns one row with `insertId` and `rowsAffected`.
    Exec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CustomQueryDecl {
    pub query: String,
    #[serde(default)]
    pub parameters: Vec<FieldDecl>,
    #[serde(default)]
    pub columns: IndexMap<String, FieldDecl>,
    #[serde(default, rename = "type")]
    pub kind: CustomQueryKind,
}

/// A named SQL template with typed positional parameters and typed output
/// columns.
#[derive(Debug, Clone)]
pub struct CustomQuery {
    pub name: String,
    pub query: String,
    pub parameters: Vec<Field>,
    pub columns: IndexMap<String, Field>,
    pub kind: CustomQueryKind,
}

fn placeholder_count(template: &str) -> usize {
    template.matches('?').count()
}

impl CustomQuery {
    pub(crate) fn from_decl(name: &str, decl: CustomQueryDecl) -> Result<Self> {
        let context = |part: String| format!("customQueries.{name}.{part}");
        let parameters = decl
            .parameters
            .iter()
            .enumerate()
            .map(|(i, d)| {
                Field::from_decl(d)
                    .map_err(|e| SchemaqlError::schema(context(format!("[in][{i}]")), e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let columns = decl
            .columns
            .iter()
            .map(|(col, d)| {
                Field::from_decl(d)
                    .map(|f| (col.clone(), f))
                    .map_err(|e| SchemaqlError::schema(context(format!("[out][{col}]")), e.to_string()))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        let placeholders = placeholder_count(&decl.query);
        if placeholders != parameters.len() {
            return Err(SchemaqlError::schema(
                context("query".to_string()),
                format!(
                    "template has {placeholders} placeholders but {} parameters are declared",
                    parameters.len()
                ),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            query: decl.query,
            parameters,
            columns,
            kind: decl.kind,
        })
    }

    /// Forward-convert the inputs in placeholder order. The template's `?`
    /// tokens are bound, never spliced into the SQL text.
    pub fn bind(&self, inputs: &[Value], context: &dyn Context) -> Result<(String, Vec<SqlValue>)> {
        if inputs.len() != self.parameters.len() {
            return Err(SchemaqlError::invalid_condition(format!(
                "Could not run query {}, got {} parameters, expected {}",
                self.name,
                inputs.len(),
                self.parameters.len()
            )));
        }
        let params = self
            .parameters
            .iter()
            .zip(inputs)
            .enumerate()
            .map(|(i, (field, input))| {
                field
                    .to_storage(input, context)
                    .map_err(|e| e.at_path(&format!("{}[{i}]", self.name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((self.query.clone(), params))
    }
}
