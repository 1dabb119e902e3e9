//! Post-processing of driver results.

use crate::error::{QbError, QbResult};
use crate::grammar::Dialect;
use crate::query::QueryBuilder;
use crate::row::{FromValue, Row};
use crate::value::Value;
use std::fmt;

/// Shapes rows returned by the driver before they reach the caller.
pub trait Processor: Send + Sync + fmt::Debug {
    /// Hook over SELECT results. The default returns the rows unchanged.
    fn process_select(&self, query: &QueryBuilder, rows: Vec<Row>) -> Vec<Row> {
        let _ = query;
        rows
    }

    /// Column name field in the dialect's column listing rows.
    fn column_listing_field(&self) -> &'static str;

    /// Reduce column listing rows to column names.
    fn process_column_listing(&self, rows: &[Row]) -> Vec<String> {
        let field = self.column_listing_field();
        rows.iter()
            .filter_map(|row| match row.get(field) {
                Some(Value::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Read the generated key from the row returned by `INSERT ... RETURNING`.
    fn process_insert_get_id(&self, rows: &[Row], sequence: &str) -> QbResult<i64> {
        let row = rows
            .first()
            .ok_or_else(|| QbError::not_found("INSERT returned no rows"))?;
        match row.get(sequence) {
            Some(_) => row.try_get(sequence),
            None => row
                .get_index(0)
                .ok_or_else(|| QbError::decode(sequence, "empty row"))
                .and_then(|value| {
                    i64::from_value(value)
                        .map_err(|message| QbError::decode(sequence, message))
                }),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlProcessor;

impl Processor for MySqlProcessor {
    fn column_listing_field(&self) -> &'static str {
        "column_name"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresProcessor;

impl Processor for PostgresProcessor {
    fn column_listing_field(&self) -> &'static str {
        "column_name"
    }
}

/// `pragma table_info` reports the column in `name`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteProcessor;

impl Processor for SqliteProcessor {
    fn column_listing_field(&self) -> &'static str {
        "name"
    }
}

/// The processor matching `dialect`.
pub fn processor_for(dialect: Dialect) -> Box<dyn Processor> {
    match dialect {
        Dialect::MySql => Box::new(MySqlProcessor),
        Dialect::Postgres => Box::new(PostgresProcessor),
        Dialect::Sqlite => Box::new(SqliteProcessor),
    }
}
