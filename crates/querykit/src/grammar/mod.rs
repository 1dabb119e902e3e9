//! Dialect-aware SQL grammar.
//!
//! [`Grammar`] holds what every compiler needs regardless of statement kind:
//! identifier quoting, table prefixing and placeholder rendering.
//! [`QueryGrammar`] compiles DML statements on top of it; the schema grammar
//! lives in [`crate::schema`].
//!
//! Dialect differences are expressed as exhaustive `match`es over [`Dialect`],
//! so adding a dialect is a compile error until every renderer handles it.

mod mysql;
mod postgres;
mod query;
mod sqlite;


pub use query::{CompiledQuery, QueryGrammar};

use crate::error::QbError;
use crate::ident::{self, Identifier};
use crate::query::{ColumnRef, TableRef};
use crate::value::Param;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Operators accepted by every dialect (compared case-insensitively).
pub const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>", "like", "like binary", "not like", "ilike", "&",
    "|", "^", "<<", ">>", "rlike", "not rlike", "regexp", "not regexp", "~", "~*", "!~", "!~*",
    "similar to", "not similar to", "not ilike", "~~*", "!~~*",
];

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Identifier quote character.
    pub fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        }
    }

    /// Operators this dialect accepts on top of [`OPERATORS`].
    pub fn extra_operators(self) -> &'static [&'static str] {
        match self {
            Dialect::MySql => mysql::OPERATORS,
            Dialect::Postgres => postgres::OPERATORS,
            Dialect::Sqlite => sqlite::OPERATORS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(QbError::Config(format!("unknown dialect '{other}'"))),
        }
    }
}

/// Dialect-independent identifier wrapping and parameter rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    dialect: Dialect,
    table_prefix: String,
}

impl Grammar {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
        }
    }

    /// Set the prefix prepended to every table name.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Check whether `operator` is known to the canonical list or this dialect.
    pub fn is_valid_operator(&self, operator: &str) -> bool {
        let op = operator.trim().to_ascii_lowercase();
        OPERATORS.contains(&op.as_str()) || self.dialect.extra_operators().contains(&op.as_str())
    }

    /// Wrap a column-position identifier.
    pub fn wrap(&self, value: &str) -> String {
        self.wrap_identifier(value, false)
    }

    /// Wrap a column reference, passing raw expressions through.
    pub fn wrap_column(&self, column: &ColumnRef) -> String {
        match column {
            ColumnRef::Name(name) => self.wrap(name),
            ColumnRef::Raw(expr) => expr.render().to_string(),
        }
    }

    /// Wrap a table-position identifier, applying the table prefix.
    pub fn wrap_table(&self, table: &str) -> String {
        let prefixed = format!("{}{}", self.table_prefix, table);
        self.wrap_identifier(&prefixed, true)
    }

    /// Wrap a table reference, passing raw expressions through.
    pub fn wrap_table_ref(&self, table: &TableRef) -> String {
        match table {
            TableRef::Name(name) => self.wrap_table(name),
            TableRef::Raw(expr) => expr.render().to_string(),
        }
    }

    /// Quote a single segment with the dialect quote character.
    pub fn wrap_segment(&self, segment: &str) -> String {
        ident::quote_segment(segment, self.dialect.quote_char())
    }

    fn wrap_identifier(&self, value: &str, table_position: bool) -> String {
        match ident::parse(value) {
            Identifier::Star => "*".to_string(),
            Identifier::Aliased { target, alias } => {
                let target = self.wrap_identifier(target, table_position);
                let alias = if table_position {
                    self.wrap_segment(&format!("{}{}", self.table_prefix, alias))
                } else {
                    self.wrap_segment(alias)
                };
                format!("{target} AS {alias}")
            }
            Identifier::Json { column, path } => self.wrap_json_selector(column, &path),
            Identifier::Segments(segments) => self.wrap_segments(&segments, table_position),
        }
    }

    fn wrap_segments(&self, segments: &[&str], table_position: bool) -> String {
        let qualified = segments.len() > 1;
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if i == 0 && qualified && !table_position {
                // The leading segment of `table.column` names a table.
                let table = format!("{}{}", self.table_prefix, segment);
                ident::write_quoted(&mut out, &table, self.dialect.quote_char());
            } else if *segment == "*" {
                out.push('*');
            } else {
                ident::write_quoted(&mut out, segment, self.dialect.quote_char());
            }
        }
        out
    }

    fn wrap_json_selector(&self, column: &str, path: &[&str]) -> String {
        let field = self.wrap(column);
        match self.dialect {
            Dialect::MySql => mysql::wrap_json_selector(&field, path),
            Dialect::Postgres => postgres::wrap_json_selector(&field, path),
            Dialect::Sqlite => sqlite::wrap_json_selector(&field, path),
        }
    }

    /// Render a list of columns separated by commas.
    pub fn columnize(&self, columns: &[ColumnRef]) -> String {
        if columns.is_empty() {
            return "*".to_string();
        }
        columns
            .iter()
            .map(|c| self.wrap_column(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render a placeholder, or the raw fragment for expressions.
    pub fn parameter(&self, param: &Param) -> String {
        match param {
            Param::Value(_) => "?".to_string(),
            Param::Raw(expr) => expr.render().to_string(),
        }
    }

    /// Render a comma separated placeholder list.
    pub fn parameterize(&self, params: &[Param]) -> String {
        params
            .iter()
            .map(|p| self.parameter(p))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Build a JSON path literal: `'$."a"."b"'`.
pub(crate) fn json_path(path: &[&str]) -> String {
    let quoted: Vec<String> = path
        .iter()
        .map(|p| format!("\"{}\"", p.replace('\'', "''")))
        .collect();
    format!("'$.{}'", quoted.join("."))
}
