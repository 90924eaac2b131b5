use crate::common::{company_model, user_model};
use indexmap::IndexMap;
use schemaql::types::{password, SqlValue};
use schemaql::{MapContext, Model, Query, QueryConditions, SchemaqlError};
use serde_json::{json, Value};

fn values(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn note_model() -> Model {
    Model::from_value(json!({
        "collections": {
            "note": {"fields": {
                "name": {"type": "string"},
                "author": {"type": "int", "default": "#user"}
            }}
        }
    }))
    .unwrap()
}

#[test]
fn test_update_is_capped_at_one_row_by_default() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff").pk(3), &ctx).unwrap();
    let stmt = query
        .build_update(&values(&[("name", json!("Ann")), ("active", json!(false))]))
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE staff t0 SET t0.name = ?, t0.active = ? WHERE t0.id = ? LIMIT 1"
    );
    assert_eq!(
        stmt.params,
        vec![SqlValue::Text("Ann".to_string()), SqlValue::Int(0), SqlValue::Int(3)]
    );
}

#[test]
fn test_update_with_positive_limit() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff").filter("active", json!(true)).limit(5);
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query.build_update(&values(&[("bio", json!("on leave"))])).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE staff t0 SET t0.bio = ? WHERE t0.active = ? LIMIT 5"
    );
}

#[test]
fn test_uncapped_update_reaches_joined_tables() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff").pk(3).limit(-1);
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query
        .build_update(&values(&[("employer.name", json!("Initech"))]))
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE staff t0 LEFT JOIN company t1 ON t1.id = t0.employer SET t1.name = ? WHERE t0.id = ?"
    );
    assert_eq!(
        stmt.params,
        vec![SqlValue::Text("Initech".to_string()), SqlValue::Int(3)]
    );
}

#[test]
fn test_capped_update_of_joined_field_fails() {
    let model = company_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("staff").pk(3).limit(1);
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    assert!(matches!(
        query.build_update(&values(&[("employer.name", json!("Initech"))])),
        Err(SchemaqlError::InvalidCondition { .. })
    ));
}

#[test]
fn test_capped_update_with_search_over_joined_column_fails() {
    let model = company_model();
    let ctx = MapContext::new();
    let changes = values(&[("name", json!("Ann"))]);

    let mut capped = Query::new(&model, QueryConditions::new("staff").search("*", "acme"), &ctx).unwrap();
    assert!(matches!(
        capped.build_update(&changes),
        Err(SchemaqlError::InvalidCondition { .. })
    ));

    let conditions = QueryConditions::new("staff").search("*", "acme").limit(-1);
    let mut uncapped = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = uncapped.build_update(&changes).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE staff t0 LEFT JOIN company t1 ON t1.id = t0.employer SET t0.name = ? \
         WHERE (t0.name LIKE ? OR t0.email LIKE ? OR t0.bio LIKE ? OR t1.name LIKE ?)"
    );
    assert_eq!(stmt.params.len(), 5);
}

#[test]
fn test_capped_update_with_root_search_keeps_limit() {
    let model = user_model();
    let ctx = MapContext::new();
    let conditions = QueryConditions::new("user").search("*", "ali");
    let mut query = Query::new(&model, conditions, &ctx).unwrap();
    let stmt = query.build_update(&values(&[("age", json!(31))])).unwrap();
    assert_eq!(stmt.sql, "UPDATE user t0 SET t0.age = ? WHERE t0.name LIKE ? LIMIT 1");
}

#[test]
fn test_empty_changeset_fails() {
    let model = user_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("user"), &ctx).unwrap();
    assert!(matches!(
        query.build_update(&IndexMap::new()),
        Err(SchemaqlError::InvalidCondition { .. })
    ));
}

#[test]
fn test_insert_hashes_passwords_and_applies_defaults() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff"), &ctx).unwrap();
    let stmt = query
        .build_insert(&values(&[("name", json!("Ann")), ("password", json!("s3cret"))]))
        .unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO staff (name, password, active) VALUES (?, ?, ?)"
    );
    match &stmt.params[1] {
        SqlValue::Text(hash) => assert!(password::verify_password("s3cret", hash)),
        other => panic!("unexpected password param {other:?}"),
    }
    assert_eq!(stmt.params[2], SqlValue::Int(1));
}

#[test]
fn test_insert_resolves_context_defaults() {
    let model = note_model();
    let ctx = MapContext::new().with("user", 12);
    let mut query = Query::new(&model, QueryConditions::new("note"), &ctx).unwrap();
    let stmt = query.build_insert(&values(&[("name", json!("hi"))])).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO note (name, author) VALUES (?, ?)");
    assert_eq!(stmt.params[1], SqlValue::Int(12));
}

#[test]
fn test_insert_skips_failing_default() {
    let model = note_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("note"), &ctx).unwrap();
    let stmt = query.build_insert(&values(&[("name", json!("hi"))])).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO note (name) VALUES (?)");
}

#[test]
fn test_insert_rejects_joined_and_unknown_fields() {
    let model = company_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("staff"), &ctx).unwrap();
    assert!(matches!(
        query.build_insert(&values(&[("employer.name", json!("Acme"))])),
        Err(SchemaqlError::NotRootField { .. })
    ));
    let mut query = Query::new(&model, QueryConditions::new("staff"), &ctx).unwrap();
    assert!(matches!(
        query.build_insert(&values(&[("nickname", json!("A"))])),
        Err(SchemaqlError::UnknownField { .. })
    ));
}

#[test]
fn test_insert_conversion_error_names_field() {
    let model = user_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("user"), &ctx).unwrap();
    match query.build_insert(&values(&[("age", json!([1]))])) {
        Err(SchemaqlError::Conversion { path, .. }) => assert_eq!(path, "age"),
        other => panic!("expected conversion error, got {other:?}"),
    }
}

#[test]
fn test_delete_targets_one_row() {
    let model = user_model();
    let ctx = MapContext::new();
    let mut query = Query::new(&model, QueryConditions::new("user"), &ctx).unwrap();
    let stmt = query.build_delete(42).unwrap();
    assert_eq!(stmt.sql, "DELETE FROM user WHERE id = ? LIMIT 1");
    assert_eq!(stmt.params, vec![SqlValue::Int(42)]);
}
