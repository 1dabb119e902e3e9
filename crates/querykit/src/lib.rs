//! # querykit
//!
//! A fluent, dialect-agnostic SQL query and schema builder.
//!
//! ## Features
//!
//! - **Placeholders only**: every literal value becomes a `?` binding, in the
//!   exact order the placeholders appear in the SQL
//! - **Three dialects**: MySQL, Postgres and SQLite, each with its own quoting,
//!   JSON operators, date functions and UPDATE/DELETE rewrites
//! - **Bring your own driver**: implement [`Connection`] and every builder can
//!   run against it
//! - **Schema builder**: blueprints compile to DDL per dialect
//! - **Observability**: `tracing` events for compilation and execution, plus
//!   [`LoggedConnection`] for timing and slow query warnings
//!
//! ## Query builder
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let users = conn
//!     .table("users")
//!     .where_eq("active", true)
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .get(&conn)
//!     .await?;
//!
//! conn.table("users")
//!     .insert(&conn, Record::new().set("email", "alice@example.com"))
//!     .await?;
//!
//! conn.table("users")
//!     .where_eq("id", 7)
//!     .update(&conn, Record::new().set("active", false))
//!     .await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod expression;
pub mod grammar;
pub mod ident;
pub mod logging;
pub mod prelude;
pub mod processor;
pub mod query;
pub mod row;
pub mod schema;
pub mod value;

pub use config::ConnectionConfig;
pub use connection::{Connection, RowStream};
pub use error::{QbError, QbResult};
pub use expression::{Expression, raw};
pub use grammar::{CompiledQuery, Dialect, Grammar, QueryGrammar};
pub use logging::{LogConfig, LoggedConnection};
pub use processor::{MySqlProcessor, PostgresProcessor, Processor, SqliteProcessor, processor_for};
pub use query::{
    BindingKind, ColumnRef, Direction, JoinBuilder, JoinType, Lock, QueryBuilder, QueryObj,
    Record, Subquery, TableRef,
};
pub use row::{FromRow, FromValue, Row};
pub use schema::{Blueprint, ColumnDefinition, ColumnType, SchemaBuilder, SchemaGrammar};
pub use value::{Param, Value};
