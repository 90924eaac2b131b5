use crate::common::{company_model, sqlite_database, COMPANY_DDL};
use schemaql::{Comparator, Database, MapContext, QueryConditions};
use serde_json::json;

/// Ann works at Acme (Oslo) with one 90 minute timesheet; Bob has no
/// employer and two one hour timesheets; Cid has none.
async fn seeded_company() -> Database {
    let db = sqlite_database(company_model(), &COMPANY_DDL).await;
    let statements = [
        "INSERT INTO company (id, name, city) VALUES (1, 'Acme', 'Oslo')",
        "INSERT INTO staff (id, name, employer) VALUES (1, 'Ann', 1)",
        "INSERT INTO staff (id, name) VALUES (2, 'Bob')",
        "INSERT INTO staff (id, name) VALUES (3, 'Cid')",
        "INSERT INTO timesheet (staff, start, stop) VALUES (1, 0, 5400)",
        "INSERT INTO timesheet (staff, start, stop) VALUES (2, 0, 3600)",
        "INSERT INTO timesheet (staff, start, stop) VALUES (2, 100, 3700)",
    ];
    {
        let mut conn = db.pool().checkout().await.unwrap();
        for statement in statements {
            sqlx::query(statement).execute(&mut *conn).await.unwrap();
        }
    }
    db
}

#[tokio::test]
async fn test_total_duration_sums_fractional_hours() {
    let db = seeded_company().await;
    let rows = db
        .select(
            QueryConditions::new("staff").fieldset("hours").sort("name", 1),
            &MapContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], json!("Ann"));
    assert_eq!(rows[0]["timesheet"], json!(1.5));
    assert_eq!(rows[1]["timesheet"], json!(2.0));
    // no timesheets: SUM is NULL and the path is omitted
    assert!(!rows[2].contains_key("timesheet"));
}

#[tokio::test]
async fn test_total_duration_having_condition() {
    let db = seeded_company().await;
    let conditions = QueryConditions::new("staff")
        .fieldset("hours")
        .where_condition("timesheet", Comparator::Gt, json!(1.75));
    let rows = db.select(conditions, &MapContext::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Bob"));
}

#[tokio::test]
async fn test_aggregate_count_and_having() {
    let db = seeded_company().await;
    let ctx = MapContext::new();
    let rows = db
        .select(QueryConditions::new("staff").fieldset("effort").sort("name", 1), &ctx)
        .await
        .unwrap();
    let counts: Vec<_> = rows.iter().map(|r| r["timesheet.start"].clone()).collect();
    assert_eq!(counts, vec![json!(1), json!(2), json!(0)]);

    let busy = db
        .select(
            QueryConditions::new("staff")
                .fieldset("effort")
                .where_condition("timesheet.start", Comparator::Gt, json!(1)),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0]["name"], json!("Bob"));
}

#[tokio::test]
async fn test_raw_aggregate_column_filters_in_having() {
    let db = seeded_company().await;
    let ctx = MapContext::new();
    let rows = db
        .select(QueryConditions::new("staff").fieldset("sheets").sort("sheets", -1), &ctx)
        .await
        .unwrap();
    assert_eq!(rows[0]["name"], json!("Bob"));
    assert_eq!(rows[0]["sheets"], json!(2));

    let conditions = QueryConditions::new("staff")
        .fieldset("sheets")
        .where_condition("sheets", Comparator::Ge, json!(1))
        .sort("name", 1);
    let rows = db.select(conditions, &ctx).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("Ann"), json!("Bob")]);
}

#[tokio::test]
async fn test_raw_expression_over_joined_column() {
    let db = seeded_company().await;
    let record = db
        .select_one(
            QueryConditions::new("staff").fieldset("label").pk(1),
            &MapContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(record["label"], json!("Ann (Oslo)"));
    assert_eq!(record["id"], json!(1));
}
