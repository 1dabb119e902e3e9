//! DDL compiler shared by every dialect.

use super::blueprint::Blueprint;
use super::column::{ColumnDefinition, Modifier};
use super::command::{Command, ForeignKey};
use super::{mysql, postgres, sqlite};
use crate::error::QbResult;
use crate::grammar::{CompiledQuery, Dialect, Grammar};
use crate::ident;
use crate::value::{Param, Value};
use std::ops::Deref;
use tracing::trace;

/// Compiler for blueprints and schema introspection queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGrammar {
    base: Grammar,
    default_string_length: u32,
}

impl Deref for SchemaGrammar {
    type Target = Grammar;

    fn deref(&self) -> &Grammar {
        &self.base
    }
}

impl From<Grammar> for SchemaGrammar {
    fn from(base: Grammar) -> Self {
        Self {
            base,
            default_string_length: 255,
        }
    }
}

impl SchemaGrammar {
    pub fn new(dialect: Dialect) -> Self {
        Grammar::new(dialect).into()
    }

    pub fn with_table_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            base: self.base.with_table_prefix(prefix),
            ..self
        }
    }

    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    pub fn default_string_length(&self) -> u32 {
        self.default_string_length
    }

    /// A blueprint carrying this grammar's prefix and string length.
    pub fn blueprint(&self, table: impl Into<String>) -> Blueprint {
        Blueprint::new(table)
            .with_prefix(self.table_prefix())
            .with_default_string_length(self.default_string_length)
    }

    /// Modifiers this dialect renders, in output order.
    pub fn modifiers(&self) -> &'static [Modifier] {
        match self.dialect() {
            Dialect::MySql => mysql::MODIFIERS,
            Dialect::Postgres => postgres::MODIFIERS,
            Dialect::Sqlite => sqlite::MODIFIERS,
        }
    }

    /// Render one command. `commands` is the blueprint's full command list,
    /// which some dialects consult to inline constraints into CREATE TABLE.
    pub fn compile(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        commands: &[Command],
    ) -> QbResult<Vec<String>> {
        let statements = match self.dialect() {
            Dialect::MySql => mysql::compile(self, blueprint, command)?,
            Dialect::Postgres => postgres::compile(self, blueprint, command)?,
            Dialect::Sqlite => sqlite::compile(self, blueprint, command, commands)?,
        };
        trace!(
            target: "querykit::grammar",
            dialect = %self.dialect(),
            command = ?command,
            statements = ?statements,
            "compiled schema command"
        );
        Ok(statements)
    }

    /// `name type modifiers` for every column of the blueprint.
    pub fn column_definitions(&self, blueprint: &Blueprint) -> Vec<String> {
        blueprint
            .columns()
            .iter()
            .map(|column| self.column_sql(column))
            .collect()
    }

    pub fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.wrap(&column.name), self.type_sql(column));
        for modifier in self.modifiers() {
            if let Some(part) = self.modifier_sql(column, *modifier) {
                sql.push_str(&part);
            }
        }
        sql
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        match self.dialect() {
            Dialect::MySql => mysql::type_sql(column),
            Dialect::Postgres => postgres::type_sql(self, column),
            Dialect::Sqlite => sqlite::type_sql(self, column),
        }
    }

    fn modifier_sql(&self, column: &ColumnDefinition, modifier: Modifier) -> Option<String> {
        match self.dialect() {
            Dialect::MySql => mysql::modifier_sql(self, column, modifier),
            Dialect::Postgres => postgres::modifier_sql(self, column, modifier),
            Dialect::Sqlite => sqlite::modifier_sql(column, modifier),
        }
    }

    /// The blueprint's table, prefixed and quoted.
    pub(crate) fn wrap_blueprint(&self, blueprint: &Blueprint) -> String {
        self.wrap_table(blueprint.table())
    }

    /// Quote a list of column names.
    pub(crate) fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `alter table t add constraint name foreign key (..) references ..`
    pub(crate) fn compile_foreign(&self, blueprint: &Blueprint, foreign: &ForeignKey) -> String {
        format!(
            "alter table {} add constraint {} foreign key ({}){}",
            self.wrap_blueprint(blueprint),
            self.wrap_segment(&foreign.name),
            self.column_list(&foreign.columns),
            self.foreign_reference(foreign)
        )
    }

    /// ` references t (cols) [on delete ..] [on update ..]`
    pub(crate) fn foreign_reference(&self, foreign: &ForeignKey) -> String {
        let mut sql = format!(
            " references {} ({})",
            self.wrap_table(&foreign.on),
            self.column_list(&foreign.references)
        );
        if let Some(action) = &foreign.on_delete {
            sql.push_str(&format!(" on delete {action}"));
        }
        if let Some(action) = &foreign.on_update {
            sql.push_str(&format!(" on update {action}"));
        }
        sql
    }

    // ==================== Introspection ====================

    /// Query returning a row when `table` exists.
    pub fn compile_table_exists(&self, database: Option<&str>, table: &str) -> CompiledQuery {
        let table = format!("{}{}", self.table_prefix(), table);
        match self.dialect() {
            Dialect::MySql => CompiledQuery::new(
                mysql::TABLE_EXISTS,
                vec![database.unwrap_or_default().into(), table.into()],
            ),
            Dialect::Postgres => CompiledQuery::new(
                postgres::TABLE_EXISTS,
                vec![database.unwrap_or(postgres::DEFAULT_SCHEMA).into(), table.into()],
            ),
            Dialect::Sqlite => CompiledQuery::new(sqlite::TABLE_EXISTS, vec![table.into()]),
        }
    }

    /// Query listing the columns of `table`.
    pub fn compile_column_listing(&self, database: Option<&str>, table: &str) -> CompiledQuery {
        let prefixed = format!("{}{}", self.table_prefix(), table);
        match self.dialect() {
            Dialect::MySql => CompiledQuery::new(
                mysql::COLUMN_LISTING,
                vec![database.unwrap_or_default().into(), prefixed.into()],
            ),
            Dialect::Postgres => CompiledQuery::new(
                postgres::COLUMN_LISTING,
                vec![database.unwrap_or(postgres::DEFAULT_SCHEMA).into(), prefixed.into()],
            ),
            Dialect::Sqlite => {
                CompiledQuery::statement(format!("pragma table_info({})", self.wrap_table(table)))
            }
        }
    }

    pub fn compile_enable_foreign_key_constraints(&self) -> &'static str {
        match self.dialect() {
            Dialect::MySql => "SET FOREIGN_KEY_CHECKS=1;",
            Dialect::Postgres => "SET CONSTRAINTS ALL IMMEDIATE;",
            Dialect::Sqlite => "PRAGMA foreign_keys = ON;",
        }
    }

    pub fn compile_disable_foreign_key_constraints(&self) -> &'static str {
        match self.dialect() {
            Dialect::MySql => "SET FOREIGN_KEY_CHECKS=0;",
            Dialect::Postgres => "SET CONSTRAINTS ALL DEFERRED;",
            Dialect::Sqlite => "PRAGMA foreign_keys = OFF;",
        }
    }
}

/// Render a column default: raw expressions verbatim, everything else quoted.
pub(crate) fn default_value(param: &Param) -> String {
    match param {
        Param::Raw(expr) => expr.render().to_string(),
        Param::Value(Value::Null) => "null".to_string(),
        Param::Value(Value::Text(text)) => ident::quote_string(text),
        Param::Value(Value::Int(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::Float(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::Json(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::Date(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::DateTime(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::Uuid(v)) => ident::quote_string(&v.to_string()),
        Param::Value(Value::Bytes(v)) => ident::quote_string(&String::from_utf8_lossy(v)),
    }
}

/// `'a', 'b'` for enum and check constraints.
pub(crate) fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| ident::quote_string(v))
        .collect::<Vec<_>>()
        .join(", ")
}
