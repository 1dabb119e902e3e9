//! Schema builder: create, alter and inspect tables.
//!
//! A [`Blueprint`] records columns and commands; [`SchemaGrammar`] renders
//! them to DDL for the connection's dialect; [`SchemaBuilder`] runs the
//! statements.
//!
//! # Example
//! ```ignore
//! use querykit::schema::SchemaBuilder;
//!
//! let schema = SchemaBuilder::new(&conn);
//! schema
//!     .create("users", |table| {
//!         table.increments("id");
//!         table.string("email").unique();
//!         table.timestamps();
//!     })
//!     .await?;
//! assert!(schema.has_column("users", "email").await?);
//! ```

mod blueprint;
mod column;
mod command;
mod grammar;
mod mysql;
mod postgres;
mod sqlite;

#[cfg(test)]
mod tests;

pub use blueprint::Blueprint;
pub use column::{ColumnDefinition, ColumnType, IndexKind, Modifier};
pub use command::{Command, ForeignKey, IndexCommand};
pub use grammar::SchemaGrammar;

use crate::connection::Connection;
use crate::error::QbResult;
use tracing::debug;

/// Runs DDL against a connection.
#[derive(Debug)]
pub struct SchemaBuilder<'c, C> {
    conn: &'c C,
}

impl<C> Clone for SchemaBuilder<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for SchemaBuilder<'_, C> {}

impl<'c, C: Connection> SchemaBuilder<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn grammar(&self) -> &SchemaGrammar {
        self.conn.schema_grammar()
    }

    /// A blueprint configured for this connection.
    pub fn blueprint(&self, table: &str) -> Blueprint {
        self.grammar().blueprint(table)
    }

    /// Create a table.
    pub async fn create<F>(&self, table: &str, define: F) -> QbResult<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = self.blueprint(table);
        blueprint.create();
        define(&mut blueprint);
        self.build(&blueprint).await
    }

    /// Alter an existing table.
    pub async fn table<F>(&self, table: &str, define: F) -> QbResult<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = self.blueprint(table);
        define(&mut blueprint);
        self.build(&blueprint).await
    }

    pub async fn drop(&self, table: &str) -> QbResult<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop();
        self.build(&blueprint).await
    }

    pub async fn drop_if_exists(&self, table: &str) -> QbResult<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop_if_exists();
        self.build(&blueprint).await
    }

    pub async fn rename(&self, from: &str, to: &str) -> QbResult<()> {
        let mut blueprint = self.blueprint(from);
        blueprint.rename(to);
        self.build(&blueprint).await
    }

    pub async fn has_table(&self, table: &str) -> QbResult<bool> {
        let compiled = self
            .grammar()
            .compile_table_exists(self.conn.database_name(), table);
        debug!(target: "querykit::query", kind = "has_table", sql = %compiled.sql, "dispatching statement");
        let rows = self.conn.select(&compiled.sql, &compiled.bindings).await?;
        Ok(!rows.is_empty())
    }

    /// Column check, ignoring case.
    pub async fn has_column(&self, table: &str, column: &str) -> QbResult<bool> {
        self.has_columns(table, &[column]).await
    }

    /// Whether every one of `columns` exists on `table`, ignoring case.
    pub async fn has_columns(&self, table: &str, columns: &[&str]) -> QbResult<bool> {
        let listing: Vec<String> = self
            .get_column_listing(table)
            .await?
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect();
        Ok(columns
            .iter()
            .all(|c| listing.contains(&c.to_lowercase())))
    }

    pub async fn get_column_listing(&self, table: &str) -> QbResult<Vec<String>> {
        let compiled = self
            .grammar()
            .compile_column_listing(self.conn.database_name(), table);
        debug!(target: "querykit::query", kind = "column_listing", sql = %compiled.sql, "dispatching statement");
        let rows = self.conn.select(&compiled.sql, &compiled.bindings).await?;
        Ok(self.conn.processor().process_column_listing(&rows))
    }

    pub async fn enable_foreign_key_constraints(&self) -> QbResult<bool> {
        let sql = self.grammar().compile_enable_foreign_key_constraints();
        self.conn.statement(sql, &[]).await
    }

    pub async fn disable_foreign_key_constraints(&self) -> QbResult<bool> {
        let sql = self.grammar().compile_disable_foreign_key_constraints();
        self.conn.statement(sql, &[]).await
    }

    /// Run every statement of a blueprint, stopping at the first failure.
    pub async fn build(&self, blueprint: &Blueprint) -> QbResult<()> {
        for sql in blueprint.to_sql(self.grammar())? {
            debug!(target: "querykit::query", kind = "schema", sql = %sql, "dispatching statement");
            self.conn.statement(&sql, &[]).await?;
        }
        Ok(())
    }
}
