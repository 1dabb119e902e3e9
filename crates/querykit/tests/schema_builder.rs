//! Schema builder against a recording connection.

mod common;

use common::{RecordingConnection, row};
use querykit::prelude::*;
use querykit::ConnectionConfig;

#[tokio::test]
async fn create_inlines_foreign_keys_on_sqlite() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::Sqlite));
    let schema = SchemaBuilder::new(&conn);

    schema
        .create("posts", |table| {
            table.increments("id");
            table.integer("user_id");
            table
                .foreign(["user_id"])
                .references(["id"])
                .on("users")
                .cascade_on_delete();
        })
        .await
        .unwrap();

    assert_eq!(
        conn.statements(),
        vec![
            "create table \"posts\" (\"id\" integer not null primary key autoincrement, \
             \"user_id\" integer not null, \
             foreign key(\"user_id\") references \"users\" (\"id\") on delete cascade)"
        ]
    );
}

#[tokio::test]
async fn alter_drop_and_rename() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::MySql).with_table_prefix("wp_"));
    let schema = SchemaBuilder::new(&conn);

    schema
        .table("users", |table| {
            table.string("nickname").nullable();
            table.index(["nickname"]);
        })
        .await
        .unwrap();
    schema.rename("users", "members").await.unwrap();
    schema.drop_if_exists("sessions").await.unwrap();

    assert_eq!(
        conn.statements(),
        vec![
            "alter table `wp_users` add `nickname` varchar(255) null",
            "alter table `wp_users` add index `wp_users_nickname_index`(`nickname`)",
            "rename table `wp_users` to `wp_members`",
            "drop table if exists `wp_sessions`",
        ]
    );
}

#[tokio::test]
async fn has_table_binds_schema_and_prefixed_name() {
    let config = ConnectionConfig::new(Dialect::Postgres)
        .with_table_prefix("app_")
        .with_database("tenant");
    let conn = RecordingConnection::new(&config);
    conn.push_rows(vec![row([("table_name", "app_users".into())])]);

    let schema = SchemaBuilder::new(&conn);
    assert!(schema.has_table("users").await.unwrap());
    assert!(!schema.has_table("ghosts").await.unwrap());

    let executed = conn.executed();
    assert_eq!(
        executed[0].bindings,
        vec![Value::from("tenant"), Value::from("app_users")]
    );
}

#[tokio::test]
async fn column_checks_ignore_case() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::Sqlite));
    let listing = || {
        vec![
            row([("cid", Value::Int(0)), ("name", "ID".into())]),
            row([("cid", Value::Int(1)), ("name", "Email".into())]),
        ]
    };
    conn.push_rows(listing());
    conn.push_rows(listing());
    conn.push_rows(listing());

    let schema = SchemaBuilder::new(&conn);
    assert_eq!(
        schema.get_column_listing("users").await.unwrap(),
        vec!["ID".to_string(), "Email".to_string()]
    );
    assert!(schema.has_column("users", "email").await.unwrap());
    assert!(!schema.has_columns("users", &["id", "name"]).await.unwrap());
    assert_eq!(conn.statements()[0], "pragma table_info(\"users\")");
}

#[tokio::test]
async fn foreign_key_constraint_toggles() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::MySql));
    let schema = SchemaBuilder::new(&conn);

    assert!(schema.disable_foreign_key_constraints().await.unwrap());
    assert!(schema.enable_foreign_key_constraints().await.unwrap());
    assert_eq!(
        conn.statements(),
        vec!["SET FOREIGN_KEY_CHECKS=0;", "SET FOREIGN_KEY_CHECKS=1;"]
    );
}

#[tokio::test]
async fn unsupported_ddl_stops_before_the_driver() {
    let conn = RecordingConnection::new(&ConnectionConfig::new(Dialect::Sqlite));
    let schema = SchemaBuilder::new(&conn);

    let err = schema
        .table("users", |table| {
            table.drop_foreign("users_team_id_foreign");
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QbError::Unsupported { .. }));
    assert!(conn.executed().is_empty());
}
