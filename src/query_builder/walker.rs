//! Field-set walking.
//!
//! Each entry is walked from the root table. Relation segments are followed
//! through [`Query::left_join`]; the final segment becomes a projected field.
//! A field name that doesn't resolve ends that entry's walk without a
//! projection, while a resolved non-reference intermediate fails the build.

use super::joins::Join;
use super::query::{MappedTable, Projection, Query};
use crate::error::{Result, SchemaqlError};
use crate::schema::{
    AggregateEntry, AggregateFunction, DirectEntry, FieldSetEntry, RawEntry, TimeDurationEntry,
};
use crate::types::Field;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static BRACKET_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]+)\]").expect("bracket token pattern is valid")
});

pub(crate) fn walk_entry<'a>(
    query: &mut Query<'a>,
    entry: &FieldSetEntry,
    root: &MappedTable<'a>,
) -> Result<()> {
    match entry {
        FieldSetEntry::Direct(direct) => walk_direct(query, direct, root.clone(), 0),
        FieldSetEntry::Raw(raw) => walk_raw(query, raw, root),
        FieldSetEntry::Aggregate(aggregate) => walk_aggregate(query, aggregate, root),
        FieldSetEntry::TimeDuration(duration) => walk_time_duration(query, duration, root),
    }
}

fn walk_direct<'a>(
    query: &mut Query<'a>,
    entry: &DirectEntry,
    table: MappedTable<'a>,
    depth: usize,
) -> Result<()> {
    let Some(name) = entry.segments.get(depth) else {
        return Ok(());
    };
    let Some(field) = table.collection.field(name) else {
        debug!(path = %entry.path, segment = %name, "Skipping unresolved fieldset segment");
        return Ok(());
    };
    if depth + 1 == entry.segments.len() {
        query.include_field(&entry.path, field.clone(), &table, Projection::Column);
        return Ok(());
    }
    let next = query.left_join(&table, name)?;
    walk_direct(query, entry, next, depth + 1)
}

/// Follow every segment but the last as a relation; returns the table the
/// last segment lives on.
fn walk_relations<'a>(
    query: &mut Query<'a>,
    base: &MappedTable<'a>,
    segments: &[&str],
) -> Result<MappedTable<'a>> {
    let mut table = base.clone();
    for segment in segments {
        table = query.left_join(&table, segment)?;
    }
    Ok(table)
}

fn walk_raw<'a>(query: &mut Query<'a>, entry: &RawEntry, base: &MappedTable<'a>) -> Result<()> {
    let mut expression = String::with_capacity(entry.query.len());
    let mut last = 0;
    for caps in BRACKET_TOKEN.captures_iter(&entry.query) {
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let segments: Vec<&str> = token.as_str().split('.').collect();
        let (column, relations) = segments
            .split_last()
            .ok_or_else(|| SchemaqlError::schema(&entry.path, "empty raw token"))?;
        let table = walk_relations(query, base, relations)?;
        expression.push_str(&entry.query[last..whole.start()]);
        expression.push_str(&format!("{}.{}", table.alias, column));
        last = whole.end();
    }
    expression.push_str(&entry.query[last..]);

    if let Some(template) = &entry.join {
        let join = BRACKET_TOKEN.replace_all(template, |caps: &Captures| {
            let path = &caps[1];
            match query.mapped_table(path) {
                Some(table) => table.alias.clone(),
                None => path.to_string(),
            }
        });
        query.joins.push(Join::raw(&join));
    }

    query.include_field(
        &entry.path,
        entry.data_type.clone(),
        base,
        Projection::Expression(expression),
    );
    Ok(())
}

/// Which table a dependent collection points back at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// The table the entry was walked from.
    Base,
    /// The last table reached through the leading relation segments.
    Link,
}

/// Walk leading relation segments, then include the dependent collection
/// named by the next segment, joined on its implicit foreign key to the
/// anchor table's primary key. Returns the dependent table and the index of
/// the segment naming it.
fn include_dependent<'a>(
    query: &mut Query<'a>,
    base: &MappedTable<'a>,
    path: &str,
    segments: &[String],
    anchor: Anchor,
) -> Result<(MappedTable<'a>, usize)> {
    let mut link = base.clone();
    let mut index = 0;
    while index < segments.len() && link.collection.field(&segments[index]).is_some() {
        link = query.left_join(&link, &segments[index])?;
        index += 1;
    }
    let dependent = segments.get(index).ok_or_else(|| {
        SchemaqlError::schema(path, "path names no dependent collection")
    })?;
    let target = match anchor {
        Anchor::Base => base,
        Anchor::Link => &link,
    };
    // Base-anchored joins don't depend on the leading relations.
    let join_path = match anchor {
        Anchor::Base => format!("R:{dependent}"),
        Anchor::Link => format!("R:{}", segments[..=index].join(".")),
    };
    let (table, created) = query.include_collection(&join_path, dependent)?;
    if created {
        query.joins.push(Join::dependent(
            table.collection.name(),
            &table.alias,
            target.collection.name(),
            &target.alias,
        ));
    }
    Ok((table, index))
}

fn walk_time_duration<'a>(
    query: &mut Query<'a>,
    entry: &TimeDurationEntry,
    base: &MappedTable<'a>,
) -> Result<()> {
    if query.mapped_field(&entry.path).is_some() {
        return Ok(());
    }
    let (dependent, index) =
        include_dependent(query, base, &entry.path, &entry.segments, Anchor::Base)?;
    if index + 1 != entry.segments.len() {
        return Err(SchemaqlError::schema(
            &entry.path,
            "totalduration path must end at the dependent collection",
        ));
    }
    let result_type = entry.data_type.clone().unwrap_or_else(Field::float);
    let alias = query
        .include_field(&entry.path, result_type, &dependent, Projection::Aggregate)
        .alias
        .clone();
    query.extra_selects.push(format!(
        "SUM({t}.{stop} - {t}.{start})/3600.0 AS {alias}",
        t = dependent.alias,
        stop = entry.stop,
        start = entry.start,
    ));
    Ok(())
}

fn walk_aggregate<'a>(
    query: &mut Query<'a>,
    entry: &AggregateEntry,
    base: &MappedTable<'a>,
) -> Result<()> {
    if query.mapped_field(&entry.path).is_some() {
        return Ok(());
    }
    let (dependent, index) =
        include_dependent(query, base, &entry.path, &entry.segments, Anchor::Link)?;
    if index + 2 != entry.segments.len() {
        return Err(SchemaqlError::schema(
            &entry.path,
            "aggregate path must end with one field of the dependent collection",
        ));
    }
    let column = &entry.segments[index + 1];
    let source = dependent
        .collection
        .field(column)
        .ok_or_else(|| SchemaqlError::UnknownField {
            collection: dependent.collection.name().to_string(),
            field: column.clone(),
        })?;
    let result_type = match (&entry.data_type, entry.function) {
        (Some(declared), _) => declared.clone(),
        (None, AggregateFunction::Count) => Field::integer(),
        (None, AggregateFunction::Sum | AggregateFunction::Avg) => Field::float(),
        (None, AggregateFunction::Min | AggregateFunction::Max) => source.clone(),
    };
    let alias = query
        .include_field(&entry.path, result_type, &dependent, Projection::Aggregate)
        .alias
        .clone();
    query.extra_selects.push(format!(
        "{}({}.{}) AS {}",
        entry.function, dependent.alias, column, alias
    ));
    Ok(())
}
