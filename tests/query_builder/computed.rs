use crate::common::company_model;
use indexmap::IndexMap;
use schemaql::query_builder::Projection;
use schemaql::types::SqlValue;
use schemaql::{Comparator, MapContext, Model, Query, QueryConditions, SchemaqlError};
use serde_json::{json, Value};

#[test]
fn test_raw_entry_substitutes_path_tokens() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff").fieldset("label"), &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT CONCAT(t0.name, ' (', t1.city, ')') AS f0, t0.id AS f1 FROM staff t0 \
         LEFT JOIN company t1 ON t1.id = t0.employer GROUP BY t0.id"
    );
    let label = query.mapped_field("label").unwrap();
    assert!(matches!(label.projection, Projection::Expression(_)));
    assert_eq!(label.field.type_name(), "string");
}

#[test]
fn test_raw_entry_expands_join_template() {
    let model = Model::from_value(json!({
        "collections": {
            "company": {"fields": {"name": {"type": "string"}}},
            "staff": {
                "fields": {
                    "name": {"type": "string"},
                    "employer": {"type": "ref", "collection": "company"}
                },
                "fieldsets": {"owned": ["employer.name", {
                    "type": "raw",
                    "query": "COUNT(DISTINCT o.id)",
                    "dataType": "int",
                    "path": "owned",
                    "join": "LEFT JOIN ownership o ON o.company = [employer].id"
                }]}
            }
        }
    }))
    .unwrap();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff").fieldset("owned"), &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t1.name AS f0, COUNT(DISTINCT o.id) AS f1, t0.id AS f2 FROM staff t0 \
         LEFT JOIN company t1 ON t1.id = t0.employer \
         LEFT JOIN ownership o ON o.company = t1.id GROUP BY t0.id"
    );
}

#[test]
fn test_total_duration_joins_dependent_collection() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff").fieldset("hours"), &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.name AS f0, t0.id AS f2, SUM(t1.stop - t1.start)/3600.0 AS f1 FROM staff t0 \
         LEFT JOIN timesheet t1 ON t1.staff = t0.id GROUP BY t0.id"
    );
    let hours = query.mapped_field("timesheet").unwrap();
    assert_eq!(hours.projection, Projection::Aggregate);
    assert_eq!(hours.field.type_name(), "float");
}

#[test]
fn test_aggregate_condition_goes_to_having() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff")
        .fieldset("effort")
        .where_condition("timesheet.start", Comparator::Gt, json!(2))
        .where_eq("name", json!("Ann"));
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.name AS f0, t0.id AS f2, COUNT(t1.start) AS f1 FROM staff t0 \
         LEFT JOIN timesheet t1 ON t1.staff = t0.id WHERE t0.name = ? GROUP BY t0.id HAVING f1 > ?"
    );
    assert_eq!(
        stmt.params,
        vec![SqlValue::Text("Ann".to_string()), SqlValue::Int(2)]
    );
    assert_eq!(
        query.mapped_field("timesheet.start").unwrap().field.type_name(),
        "integer"
    );
}

#[test]
fn test_aggregate_sort_uses_alias() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff").fieldset("effort").sort("timesheet.start", -1);
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert!(stmt.sql.ends_with("GROUP BY t0.id ORDER BY f1 DESC"));
}

#[test]
fn test_aggregate_condition_rejected_in_update() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff")
        .fieldset("effort")
        .where_condition("timesheet.start", Comparator::Gt, json!(2));
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let changes: IndexMap<String, Value> = [("name".to_string(), json!("Busy"))].into_iter().collect();
    assert!(matches!(
        query.build_update(&changes),
        Err(SchemaqlError::InvalidCondition { .. })
    ));
}

#[test]
fn test_computed_field_cannot_be_updated() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff").fieldset("label"), &ctx).unwrap();
    let changes: IndexMap<String, Value> = [("label".to_string(), json!("x"))].into_iter().collect();
    assert!(matches!(
        query.build_update(&changes),
        Err(SchemaqlError::InvalidCondition { .. })
    ));
}

fn ownership_model() -> Model {
    Model::from_value(json!({
        "collections": {
            "company": {"fields": {"name": {"type": "string"}}},
            "staff": {
                "fields": {
                    "name": {"type": "string"},
                    "employer": {"type": "ref", "collection": "company"}
                },
                "fieldsets": {"owned": ["name", {
                    "type": "raw",
                    "query": "COUNT(o.id)",
                    "dataType": "int",
                    "path": "owned",
                    "join": "LEFT JOIN ownership o ON o.staff = t0.id"
                }]}
            }
        }
    }))
    .unwrap()
}

#[test]
fn test_raw_column_condition_goes_to_having() {
    let model = ownership_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff")
        .fieldset("owned")
        .where_condition("owned", Comparator::Gt, json!(1));
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.name AS f0, COUNT(o.id) AS f1, t0.id AS f2 FROM staff t0 \
         LEFT JOIN ownership o ON o.staff = t0.id GROUP BY t0.id HAVING f1 > ?"
    );
    assert_eq!(stmt.params, vec![SqlValue::Int(1)]);
}

#[test]
fn test_raw_column_condition_rejected_in_update() {
    let model = ownership_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff")
        .fieldset("owned")
        .where_condition("owned", Comparator::Gt, json!(1))
        .limit(-1);
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let changes: IndexMap<String, Value> = [("name".to_string(), json!("Owner"))].into_iter().collect();
    assert!(matches!(
        query.build_update(&changes),
        Err(SchemaqlError::InvalidCondition { .. })
    ));
}

#[test]
fn test_total_duration_behind_relation_joins_base_table() {
    let model = Model::from_value(json!({
        "collections": {
            "project": {"fields": {"name": {"type": "string"}}},
            "task": {
                "fields": {
                    "name": {"type": "string"},
                    "project": {"type": "ref", "collection": "project"}
                },
                "fieldsets": {"h": [{
                    "type": "totalduration",
                    "path": "project.timesheet",
                    "dataType": "int",
                    "start": "start",
                    "stop": "stop"
                }]}
            },
            "timesheet": {"fields": {
                "task": {"type": "ref", "collection": "task"},
                "project": {"type": "ref", "collection": "project"},
                "start": {"type": "timestamp"},
                "stop": {"type": "timestamp"}
            }}
        }
    }))
    .unwrap();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("task").fieldset("h"), &ctx).unwrap();
    let stmt = query.build_select().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t0.id AS f1, SUM(t2.stop - t2.start)/3600.0 AS f0 FROM task t0 \
         LEFT JOIN project t1 ON t1.id = t0.project \
         LEFT JOIN timesheet t2 ON t2.task = t0.id GROUP BY t0.id"
    );
    let hours = query.mapped_field("project.timesheet").unwrap();
    assert_eq!(hours.field.type_name(), "integer");
}
