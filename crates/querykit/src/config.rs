//! Connection configuration.
//!
//! Loadable from TOML:
//!
//! ```toml
//! dialect = "postgres"
//! table_prefix = "app_"
//! database = "public"
//!
//! [log]
//! max_sql_length = 500
//! slow_query_threshold_ms = 200
//! ```
//!
//! or built fluently with [`ConnectionConfig::new`].

use crate::error::{QbError, QbResult};
use crate::grammar::{Dialect, QueryGrammar};
use crate::logging::LogConfig;
use crate::processor::{Processor, processor_for};
use crate::schema::SchemaGrammar;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

fn default_string_length() -> u32 {
    255
}

/// Everything a driver needs to build its grammars.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    pub dialect: Dialect,
    #[serde(default)]
    pub table_prefix: String,
    /// Database (MySQL) or schema (Postgres) used by existence checks.
    pub database: Option<String>,
    #[serde(default = "default_string_length")]
    pub default_string_length: u32,
    #[serde(default)]
    pub log: LogConfig,
}

impl ConnectionConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
            database: None,
            default_string_length: default_string_length(),
            log: LogConfig::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> QbResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> QbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QbError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    fn validate(&self) -> QbResult<()> {
        if self.default_string_length == 0 {
            return Err(QbError::Config(
                "default_string_length must be greater than zero".to_string(),
            ));
        }
        if self.table_prefix.chars().any(char::is_whitespace) {
            return Err(QbError::Config(format!(
                "table_prefix must not contain whitespace: {:?}",
                self.table_prefix
            )));
        }
        Ok(())
    }

    pub fn query_grammar(&self) -> Arc<QueryGrammar> {
        Arc::new(QueryGrammar::new(self.dialect).with_table_prefix(self.table_prefix.clone()))
    }

    pub fn schema_grammar(&self) -> SchemaGrammar {
        SchemaGrammar::new(self.dialect)
            .with_table_prefix(self.table_prefix.clone())
            .with_default_string_length(self.default_string_length)
    }

    pub fn processor(&self) -> Box<dyn Processor> {
        processor_for(self.dialect)
    }
}
