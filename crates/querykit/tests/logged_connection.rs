//! `LoggedConnection` and file-based configuration.

mod common;

use common::{RecordingConnection, row};
use querykit::prelude::*;
use querykit::{ConnectionConfig, LogConfig, LoggedConnection};
use std::time::Duration;

#[tokio::test]
async fn passes_results_through() {
    let inner = RecordingConnection::new(&ConnectionConfig::new(Dialect::Postgres));
    inner.push_rows(vec![row([("id", Value::Int(1))])]);
    let conn = LoggedConnection::new(inner)
        .with_config(LogConfig::new().with_slow_query_threshold(Duration::from_secs(5)));

    let rows = conn.table("users").where_eq("id", 1).get(&conn).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(conn.inner().executed()[0].bindings, vec![Value::Int(1)]);
}

#[tokio::test]
async fn driver_errors_carry_the_statement() {
    let inner = RecordingConnection::new(&ConnectionConfig::new(Dialect::MySql)).failing("boom");
    let conn = LoggedConnection::new(inner).with_config(LogConfig::new().max_sql_length(10));

    let err = conn
        .table("users")
        .where_eq("id", 1)
        .delete(&conn)
        .await
        .unwrap_err();

    match err {
        QbError::Query {
            sql,
            bindings,
            source,
        } => {
            assert_eq!(sql, "DELETE FROM `users` WHERE `id` = ?");
            assert_eq!(bindings, vec![Value::Int(1)]);
            assert!(matches!(*source, QbError::Driver(ref m) if m == "boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn schema_statements_go_through_the_wrapper() {
    let inner = RecordingConnection::new(&ConnectionConfig::new(Dialect::Sqlite));
    let conn = LoggedConnection::new(inner).with_config(LogConfig::new().enabled(false));

    SchemaBuilder::new(&conn).drop("users").await.unwrap();
    assert_eq!(conn.into_inner().statements(), vec!["drop table \"users\""]);
}

#[test]
fn config_loads_from_file() {
    let path = std::env::temp_dir().join(format!("querykit-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "dialect = \"sqlite\"\ntable_prefix = \"t_\"\n\n[log]\nslow_query_threshold_ms = 50\n",
    )
    .unwrap();

    let config = ConnectionConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.dialect, Dialect::Sqlite);
    assert_eq!(config.table_prefix, "t_");
    assert_eq!(
        config.log.slow_query_threshold(),
        Some(Duration::from_millis(50))
    );

    let missing = ConnectionConfig::load(path.with_extension("missing")).unwrap_err();
    assert!(matches!(missing, QbError::Config(_)));
}
