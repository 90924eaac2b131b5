use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// A lifecycle hook: when `when.field` is written with `when.what`, also set
/// the `set` values and optionally notify.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hook {
    pub collection: String,
    pub when: HookWhen,
    #[serde(default)]
    pub set: IndexMap<String, Value>,
    #[serde(default)]
    pub email: Option<HookEmail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookWhen {
    pub field: String,
    pub what: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookEmail {
    pub recipient: String,
    pub template: String,
}

impl Hook {
    /// Whether a changeset triggers this hook.
    pub fn matches(&self, changeset: &IndexMap<String, Value>) -> bool {
        match changeset.get(&self.when.field) {
            Some(Value::String(s)) => *s == self.when.what,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.when.what,
        }
    }
}
