//! Error types for querykit

use crate::grammar::Dialect;
use crate::value::Value;
use thiserror::Error;

/// Result type alias for querykit operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for statement construction, compilation and execution.
#[derive(Debug, Error)]
pub enum QbError {
    /// Operator not known to the canonical list or the dialect.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// A comparison operator paired with a NULL value.
    #[error("Illegal operator and value combination: {operator} NULL")]
    IllegalOperatorAndValue { operator: String },

    /// Row-value comparison with a different number of columns and values.
    #[error("The number of columns ({columns}) must match the number of values ({values})")]
    ColumnCountMismatch { columns: usize, values: usize },

    /// Ordering direction other than asc/desc.
    #[error("Order direction must be 'asc' or 'desc', got '{0}'")]
    InvalidDirection(String),

    /// Multi-row insert whose records do not share one column list.
    #[error("Insert record {index} has columns [{found}], expected [{expected}]")]
    MismatchedRecord {
        index: usize,
        expected: String,
        found: String,
    },

    /// A subquery that cannot be used in this position.
    #[error("Invalid subquery: {0}")]
    InvalidSubquery(String),

    /// Statement needs a target table but none was set.
    #[error("No table specified for {0}")]
    MissingTable(&'static str),

    /// Feature that the target dialect cannot express.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        dialect: Dialect,
        feature: &'static str,
    },

    /// Error reported by a driver implementation.
    #[error("Driver error: {0}")]
    Driver(String),

    /// Error raised while running a compiled statement.
    #[error("{source} (SQL: {sql})")]
    Query {
        sql: String,
        bindings: Vec<Value>,
        #[source]
        source: Box<QbError>,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    pub(crate) fn unsupported(dialect: Dialect, feature: &'static str) -> Self {
        Self::Unsupported { dialect, feature }
    }

    /// Attach the failing statement to this error.
    ///
    /// Errors that already carry a statement are returned unchanged.
    pub fn with_query(self, sql: impl Into<String>, bindings: &[Value]) -> Self {
        match self {
            err @ Self::Query { .. } => err,
            err => Self::Query {
                sql: sql.into(),
                bindings: bindings.to_vec(),
                source: Box::new(err),
            },
        }
    }

    /// Check if this error was raised while building a statement.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperator(_)
                | Self::IllegalOperatorAndValue { .. }
                | Self::ColumnCountMismatch { .. }
                | Self::InvalidDirection(_)
                | Self::MismatchedRecord { .. }
                | Self::InvalidSubquery(_)
                | Self::MissingTable(_)
        )
    }

    /// Check if this error was raised while compiling a statement.
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The statement attached by [`QbError::with_query`], if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for QbError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_query_wraps_once() {
        let err = QbError::driver("connection reset")
            .with_query("SELECT 1", &[Value::Int(1)])
            .with_query("SELECT 2", &[]);
        assert_eq!(err.sql(), Some("SELECT 1"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn classifies_errors() {
        assert!(QbError::InvalidOperator("<=>>".into()).is_construction());
        assert!(QbError::unsupported(Dialect::Sqlite, "spatial indexes").is_render());
        assert!(!QbError::driver("x").is_construction());
    }
}
