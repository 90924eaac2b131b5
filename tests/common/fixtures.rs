use schemaql::database::{DatabaseConnection, Pool};
use schemaql::{Database, Model};
use serde_json::json;
use sqlx::AnyConnection;
use std::sync::Arc;

/// `user{name, age}` with the default field set left implicit.
pub fn user_model() -> Model {
    Model::from_value(json!({
        "collections": {
            "user": {"fields": {
                "name": {"type": "string"},
                "age": {"type": "int"}
            }}
        }
    }))
    .expect("user model loads")
}

/// Companies, staff, projects and timesheets with computed field sets.
pub fn company_model() -> Model {
    Model::from_value(json!({
        "collections": {
            "company": {
                "fields": {
                    "name": {"type": "string"},
                    "city": {"type": "string"}
                }
            },
            "staff": {
                "fields": {
                    "name": {"type": "string"},
                    "email": {"type": "string", "label": "E-mail"},
                    "bio": {"type": "text"},
                    "active": {"type": "bool", "default": true},
                    "employer": {"type": "ref", "collection": "company"},
                    "manager": {"type": "ref", "collection": "staff"},
                    "password": {"type": "password"}
                },
                "fieldsets": {
                    "default": ["name", "email", "bio", "active", "employer.name"],
                    "chain": ["name", "manager.employer.name", "manager.manager.name"],
                    "identity": ["name", "email"],
                    "label": [{
                        "type": "raw",
                        "query": "CONCAT([name], ' (', [employer.city], ')')",
                        "dataType": "string",
                        "path": "label"
                    }],
                    "hours": [
                        "name",
                        {"type": "totalduration", "path": "timesheet", "start": "start", "stop": "stop"}
                    ],
                    "effort": [
                        "name",
                        {"type": "aggregate", "path": "timesheet.start", "function": "count"}
                    ],
                    "sheets": [
                        "name",
                        {
                            "type": "raw",
                            "query": "COUNT(ts.id)",
                            "dataType": "int",
                            "path": "sheets",
                            "join": "LEFT JOIN timesheet ts ON ts.staff = t0.id"
                        }
                    ]
                }
            },
            "timesheet": {
                "fields": {
                    "name": {"type": "string"},
                    "staff": {"type": "ref", "collection": "staff"},
                    "start": {"type": "timestamp"},
                    "stop": {"type": "timestamp"}
                }
            }
        },
        "customQueries": {
            "older_than": {
                "query": "SELECT name, age FROM user WHERE age > ? ORDER BY age",
                "parameters": [{"type": "int"}],
                "columns": {"name": {"type": "string"}, "age": {"type": "int"}}
            },
            "birthday": {
                "type": "exec",
                "query": "UPDATE user SET age = age + 1 WHERE name = ?",
                "parameters": [{"type": "string"}]
            }
        }
    }))
    .expect("company model loads")
}

/// A single-connection in-memory SQLite database, so every statement sees
/// the same schema.
pub async fn sqlite_database(model: Model, ddl: &[&str]) -> Database {
    let pool: Pool<AnyConnection> = DatabaseConnection::new("sqlite::memory:")
        .pool(1)
        .await
        .expect("sqlite pool opens");
    {
        let mut conn = pool.checkout().await.expect("checkout");
        for statement in ddl {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .expect("ddl runs");
        }
    }
    Database::new(Arc::new(model), pool)
}

pub const USER_DDL: &str =
    "CREATE TABLE user (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NULL, age INTEGER NULL)";

/// Tables backing [`company_model`].
pub const COMPANY_DDL: [&str; 3] = [
    "CREATE TABLE company (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NULL, city TEXT NULL)",
    "CREATE TABLE staff (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NULL, email TEXT NULL, \
     bio TEXT NULL, active INTEGER NOT NULL DEFAULT 0, employer INTEGER NULL, manager INTEGER NULL, \
     password TEXT NULL)",
    "CREATE TABLE timesheet (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NULL, staff INTEGER NULL, \
     start INTEGER NULL, stop INTEGER NULL)",
];
