//! Builders running against a recording connection.

mod common;

use common::{RecordingConnection, row};
use futures_util::StreamExt;
use querykit::prelude::*;
use querykit::ConnectionConfig;

fn postgres() -> RecordingConnection {
    RecordingConnection::new(&ConnectionConfig::new(Dialect::Postgres))
}

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    email: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        })
    }
}

#[tokio::test]
async fn get_sends_compiled_sql_and_bindings() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(1)), ("email", "a@x".into())])]);

    let users: Vec<User> = conn
        .table("users")
        .where_eq("active", true)
        .order_by_desc("id")
        .fetch_all(&conn)
        .await
        .unwrap();

    assert_eq!(
        users,
        vec![User {
            id: 1,
            email: "a@x".to_string()
        }]
    );
    let executed = conn.executed();
    assert_eq!(
        executed[0].sql,
        "SELECT * FROM \"users\" WHERE \"active\" = ? ORDER BY \"id\" DESC"
    );
    assert_eq!(executed[0].bindings, vec![Value::Int(1)]);
}

#[tokio::test]
async fn first_and_find_limit_to_one_row() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(7))])]);

    let found = conn.table("users").find(&conn, 7).await.unwrap();
    assert_eq!(found.unwrap().get("id"), Some(&Value::Int(7)));
    assert_eq!(
        conn.statements(),
        vec!["SELECT * FROM \"users\" WHERE \"users\".\"id\" = ? LIMIT 1"]
    );

    assert!(conn.table("users").first(&conn).await.unwrap().is_none());
}

#[tokio::test]
async fn value_and_pluck_read_single_columns() {
    let conn = postgres();
    conn.push_rows(vec![row([("email", "a@x".into())])]);
    conn.push_rows(vec![
        row([("mail", "a@x".into())]),
        row([("mail", "b@x".into())]),
    ]);

    let email = conn.table("users").value(&conn, "email").await.unwrap();
    assert_eq!(email, Some(Value::from("a@x")));

    let emails = conn
        .table("users")
        .pluck(&conn, "email as mail")
        .await
        .unwrap();
    assert_eq!(emails, vec![Value::from("a@x"), Value::from("b@x")]);
    assert_eq!(
        conn.statements()[1],
        "SELECT \"email\" AS \"mail\" FROM \"users\""
    );
}

#[tokio::test]
async fn aggregates_read_the_aggregate_column() {
    let conn = postgres();
    conn.push_rows(vec![row([("aggregate", Value::Int(3))])]);
    conn.push_rows(vec![row([("aggregate", Value::Null)])]);

    let count = conn
        .table("users")
        .select(["id", "email"])
        .where_eq("active", true)
        .count(&conn)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let sum = conn.table("orders").sum(&conn, "total").await.unwrap();
    assert_eq!(sum, Value::Int(0));

    assert_eq!(
        conn.statements(),
        vec![
            "SELECT count(*) AS aggregate FROM \"users\" WHERE \"active\" = ?",
            "SELECT sum(\"total\") AS aggregate FROM \"orders\"",
        ]
    );

    // No rows at all counts as zero.
    assert_eq!(conn.table("users").count(&conn).await.unwrap(), 0);
}

#[tokio::test]
async fn exists_reads_the_exists_column() {
    let conn = postgres();
    conn.push_rows(vec![row([("exists", Value::Int(1))])]);

    assert!(conn.table("users").exists(&conn).await.unwrap());
    assert!(conn.table("users").doesnt_exist(&conn).await.unwrap());
    assert_eq!(
        conn.statements()[0],
        "SELECT EXISTS(SELECT * FROM \"users\") AS \"exists\""
    );
}

#[tokio::test]
async fn chunk_pages_until_a_short_page() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(1))]), row([("id", Value::Int(2))])]);
    conn.push_rows(vec![row([("id", Value::Int(3))])]);

    let mut seen = Vec::new();
    let completed = conn
        .table("users")
        .order_by("id", Direction::Asc)
        .chunk(&conn, 2, |rows| {
            seen.extend(rows.into_iter().filter_map(|r| r.get("id").cloned()));
            true
        })
        .await
        .unwrap();

    assert!(completed);
    assert_eq!(seen, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(
        conn.statements(),
        vec![
            "SELECT * FROM \"users\" ORDER BY \"id\" ASC LIMIT 2 OFFSET 0",
            "SELECT * FROM \"users\" ORDER BY \"id\" ASC LIMIT 2 OFFSET 2",
        ]
    );
}

#[tokio::test]
async fn chunk_stops_when_callback_declines() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(1))])]);

    let completed = conn
        .table("users")
        .chunk(&conn, 1, |_| false)
        .await
        .unwrap();
    assert!(!completed);
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn cursor_streams_rows() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(1))]), row([("id", Value::Int(2))])]);

    let mut stream = conn.table("users").cursor(&conn).await.unwrap();
    let mut ids = Vec::new();
    while let Some(row) = stream.next().await {
        ids.push(row.unwrap().try_get::<i64>("id").unwrap());
    }
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn insert_get_id_per_dialect() {
    let conn = postgres();
    conn.push_rows(vec![row([("id", Value::Int(42))])]);
    let id = conn
        .table("users")
        .insert_get_id(&conn, Record::new().set("email", "a@x"), None)
        .await
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(
        conn.statements(),
        vec!["INSERT INTO \"users\" (\"email\") VALUES (?) RETURNING \"id\""]
    );

    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::MySql)).with_last_id(9);
    let id = conn
        .table("users")
        .insert_get_id(&conn, Record::new().set("email", "a@x"), None)
        .await
        .unwrap();
    assert_eq!(id, 9);
}

#[tokio::test]
async fn empty_inserts_do_not_reach_the_driver() {
    let conn = postgres();
    assert!(conn.table("users").insert(&conn, Record::new()).await.unwrap());
    assert!(conn.table("users").insert_many(&conn, vec![]).await.unwrap());
    assert_eq!(conn.table("users").insert_or_ignore(&conn, vec![]).await.unwrap(), 0);
    assert!(conn.executed().is_empty());
}

#[tokio::test]
async fn update_increment_and_delete_report_affected_rows() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::MySql)).with_affected(2);

    let updated = conn
        .table("users")
        .where_eq("id", 1)
        .update(&conn, Record::new().set("name", "bob"))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    conn.table("users")
        .where_eq("id", 1)
        .increment(&conn, "votes", 5, Record::new().set("touched", true))
        .await
        .unwrap();

    let deleted = conn.table("users").delete_by_id(&conn, 3).await.unwrap();
    assert_eq!(deleted, 2);

    let executed = conn.executed();
    assert_eq!(executed[0].sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
    assert_eq!(executed[0].bindings, vec![Value::from("bob"), Value::Int(1)]);
    assert_eq!(
        executed[1].sql,
        "UPDATE `users` SET `votes` = `votes` + 5, `touched` = ? WHERE `id` = ?"
    );
    assert_eq!(
        executed[2].sql,
        "DELETE FROM `users` WHERE `users`.`id` = ?"
    );
}

#[tokio::test]
async fn truncate_runs_every_statement() {
    let conn = RecordingConnection::new(
        &ConnectionConfig::new(Dialect::Sqlite).with_table_prefix("app_"),
    );
    conn.table("users").truncate(&conn).await.unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].bindings, vec![Value::from("app_users")]);
    assert_eq!(executed[1].sql, "DELETE FROM \"app_users\"");
}

#[tokio::test]
async fn compile_errors_never_reach_the_driver() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::Sqlite));
    let err = conn
        .table("users")
        .where_json_contains("tags", serde_json::json!(["a"]))
        .get(&conn)
        .await
        .unwrap_err();
    assert!(matches!(err, QbError::Unsupported { .. }));
    assert!(conn.executed().is_empty());
}
