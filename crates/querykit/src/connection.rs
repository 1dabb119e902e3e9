//! Driver boundary.
//!
//! querykit never talks to a database itself. A [`Connection`] implementation
//! receives compiled SQL with `?` placeholders and positional [`Value`]s and
//! returns [`Row`]s or affected-row counts. The grammars and processor it
//! exposes decide the dialect every builder created from it compiles for.

use crate::error::QbResult;
use crate::grammar::QueryGrammar;
use crate::processor::Processor;
use crate::query::{QueryBuilder, TableRef};
use crate::row::Row;
use crate::schema::SchemaGrammar;
use crate::value::Value;
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A database connection as seen by the builders.
///
/// Only [`Connection::select`], [`Connection::statement`],
/// [`Connection::affecting_statement`] and [`Connection::last_insert_id`]
/// talk to the driver; the remaining methods have defaults built on them.
pub trait Connection: Send + Sync {
    /// Grammar used by builders created from this connection.
    fn query_grammar(&self) -> &Arc<QueryGrammar>;

    fn schema_grammar(&self) -> &SchemaGrammar;

    fn processor(&self) -> &dyn Processor;

    /// Database (MySQL) or schema (Postgres) name used by existence checks.
    fn database_name(&self) -> Option<&str> {
        None
    }

    /// Run a query and return every row.
    fn select(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<Vec<Row>>> + Send;

    /// Run a statement; returns whether it succeeded.
    fn statement(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<bool>> + Send;

    /// Run a statement and return the number of affected rows.
    fn affecting_statement(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = QbResult<u64>> + Send;

    /// Key generated by the most recent INSERT on this connection.
    fn last_insert_id(&self) -> impl Future<Output = QbResult<i64>> + Send;

    fn insert(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<bool>> + Send {
        self.statement(sql, bindings)
    }

    fn update(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<u64>> + Send {
        self.affecting_statement(sql, bindings)
    }

    fn delete(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<u64>> + Send {
        self.affecting_statement(sql, bindings)
    }

    /// Run a query and return its rows as a stream.
    ///
    /// The default buffers the whole result; drivers that can fetch
    /// incrementally should override it.
    fn cursor(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = QbResult<RowStream>> + Send {
        async move {
            let rows = self.select(sql, bindings).await?;
            Ok(RowStream::from_rows(rows))
        }
    }

    /// Start a query against `table`.
    fn table(&self, table: impl Into<TableRef>) -> QueryBuilder {
        QueryBuilder::table(Arc::clone(self.query_grammar()), table)
    }

    /// Start a query with no table.
    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(self.query_grammar()))
    }
}

/// A stream of rows.
///
/// Pull-based: rows are produced as the caller polls, and dropping the
/// stream stops the pull.
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = QbResult<Row>> + Send>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = QbResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Stream over rows that are already in memory.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(BufferedRows {
            rows: rows.into_iter(),
        })
    }
}

impl Stream for RowStream {
    type Item = QbResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}

struct BufferedRows {
    rows: std::vec::IntoIter<Row>,
}

impl Stream for BufferedRows {
    type Item = QbResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.rows.next().map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
