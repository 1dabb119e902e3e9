//! Statement logging around any [`Connection`].
//!
//! [`LoggedConnection`] times every call into the wrapped connection, emits a
//! `debug!` event on target `querykit::sql` and a `warn!` event for queries
//! slower than the configured threshold. Errors coming back from the driver
//! get the failing statement attached with [`QbError::with_query`].
//!
//! ```ignore
//! let conn = LoggedConnection::new(driver)
//!     .with_config(LogConfig::new().with_slow_query_threshold(Duration::from_millis(200)));
//! ```

use crate::connection::{Connection, RowStream};
use crate::error::{QbError, QbResult};
use crate::grammar::QueryGrammar;
use crate::processor::Processor;
use crate::row::Row;
use crate::schema::SchemaGrammar;
use crate::value::Value;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Logging behavior of a [`LoggedConnection`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit an event per statement. Slow query warnings are sent regardless.
    pub enabled: bool,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this many milliseconds are logged at `warn`.
    pub slow_query_threshold_ms: Option<u64>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sql_length: Some(200),
            slow_query_threshold_ms: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold_ms = Some(u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn slow_query_threshold(&self) -> Option<Duration> {
        self.slow_query_threshold_ms.map(Duration::from_millis)
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

/// Cut `sql` to at most `max_bytes` without splitting a character.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A [`Connection`] that logs and times every statement.
#[derive(Debug, Clone)]
pub struct LoggedConnection<C> {
    inner: C,
    config: LogConfig,
}

impl<C: Connection> LoggedConnection<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    async fn observe<T, F>(
        &self,
        kind: &'static str,
        sql: &str,
        bindings: &[Value],
        future: F,
    ) -> QbResult<T>
    where
        F: Future<Output = QbResult<T>> + Send,
    {
        let start = Instant::now();
        let result = future.await;
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        if self.config.enabled {
            let shown = self.config.truncate_sql(sql);
            match &result {
                Ok(_) => debug!(
                    target: "querykit::sql",
                    kind,
                    params = bindings.len(),
                    elapsed_ms,
                    sql = %shown,
                    "statement finished"
                ),
                Err(err) => debug!(
                    target: "querykit::sql",
                    kind,
                    params = bindings.len(),
                    elapsed_ms,
                    sql = %shown,
                    error = %err,
                    "statement failed"
                ),
            }
        }

        if let Some(threshold) = self.config.slow_query_threshold() {
            if elapsed > threshold {
                warn!(
                    target: "querykit::sql",
                    kind,
                    elapsed_ms,
                    threshold_ms = threshold.as_millis() as u64,
                    sql = %self.config.truncate_sql(sql),
                    "slow query"
                );
            }
        }

        result.map_err(|err: QbError| err.with_query(sql, bindings))
    }
}

impl<C: Connection> Connection for LoggedConnection<C> {
    fn query_grammar(&self) -> &Arc<QueryGrammar> {
        self.inner.query_grammar()
    }

    fn schema_grammar(&self) -> &SchemaGrammar {
        self.inner.schema_grammar()
    }

    fn processor(&self) -> &dyn Processor {
        self.inner.processor()
    }

    fn database_name(&self) -> Option<&str> {
        self.inner.database_name()
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<Vec<Row>>> + Send {
        self.observe("select", sql, bindings, self.inner.select(sql, bindings))
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<bool>> + Send {
        self.observe("statement", sql, bindings, self.inner.statement(sql, bindings))
    }

    fn affecting_statement(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = QbResult<u64>> + Send {
        self.observe(
            "affecting",
            sql,
            bindings,
            self.inner.affecting_statement(sql, bindings),
        )
    }

    fn last_insert_id(&self) -> impl Future<Output = QbResult<i64>> + Send {
        self.inner.last_insert_id()
    }

    fn insert(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<bool>> + Send {
        self.observe("insert", sql, bindings, self.inner.insert(sql, bindings))
    }

    fn update(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<u64>> + Send {
        self.observe("update", sql, bindings, self.inner.update(sql, bindings))
    }

    fn delete(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<u64>> + Send {
        self.observe("delete", sql, bindings, self.inner.delete(sql, bindings))
    }

    fn cursor(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = QbResult<RowStream>> + Send {
        self.observe("cursor", sql, bindings, self.inner.cursor(sql, bindings))
    }
}
