//! Terminal operations: compile, hand off to a [`Connection`], shape the result.

use super::{Aggregate, BindingKind, ColumnRef, Component, QueryBuilder, Record, TableRef};
use crate::connection::{Connection, RowStream};
use crate::error::{QbError, QbResult};
use crate::expression::raw;
use crate::grammar::{CompiledQuery, Dialect};
use crate::ident;
use crate::row::{FromRow, FromValue, Row};
use crate::value::Value;
use tracing::debug;

fn log_statement(kind: &'static str, sql: &str, bindings: &[Value]) {
    debug!(target: "querykit::query", kind, sql = %sql, bindings = bindings.len(), "dispatching statement");
}

impl QueryBuilder {
    // ==================== Reads ====================

    /// Run the SELECT and return every row.
    pub async fn get<C: Connection>(&self, conn: &C) -> QbResult<Vec<Row>> {
        let sql = self.to_sql()?;
        let bindings = self.get_bindings();
        log_statement("select", &sql, &bindings);
        let rows = conn.select(&sql, &bindings).await?;
        Ok(conn.processor().process_select(self, rows))
    }

    /// Run the SELECT and map every row.
    pub async fn fetch_all<T: FromRow, C: Connection>(&self, conn: &C) -> QbResult<Vec<T>> {
        self.get(conn).await?.iter().map(T::from_row).collect()
    }

    /// First row, if any.
    pub async fn first<C: Connection>(&self, conn: &C) -> QbResult<Option<Row>> {
        let mut query = self.clone();
        query.limit(1);
        Ok(query.get(conn).await?.into_iter().next())
    }

    /// Row whose `id` equals `id`.
    pub async fn find<C: Connection>(
        &self,
        conn: &C,
        id: impl Into<Value>,
    ) -> QbResult<Option<Row>> {
        let mut query = self.clone();
        query.where_eq(self.id_column(), id.into());
        query.first(conn).await
    }

    /// A single column of the first row.
    pub async fn value<C: Connection>(
        &self,
        conn: &C,
        column: impl Into<ColumnRef>,
    ) -> QbResult<Option<Value>> {
        let mut query = self.clone();
        query.select([column]);
        Ok(query
            .first(conn)
            .await?
            .and_then(|row| row.get_index(0).cloned()))
    }

    /// One column from every row.
    pub async fn pluck<C: Connection>(&self, conn: &C, column: &str) -> QbResult<Vec<Value>> {
        let mut query = self.clone();
        query.select([column]);
        let key = result_key(column);
        Ok(query
            .get(conn)
            .await?
            .into_iter()
            .map(|row| row.get(key).or_else(|| row.get_index(0)).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Run the SELECT and stream its rows.
    pub async fn cursor<C: Connection>(&self, conn: &C) -> QbResult<RowStream> {
        let sql = self.to_sql()?;
        let bindings = self.get_bindings();
        log_statement("cursor", &sql, &bindings);
        conn.cursor(&sql, &bindings).await
    }

    /// Fetch `size` rows at a time and hand each page to `f`.
    ///
    /// Stops after the last page or when `f` returns `false`; the return value
    /// is `false` in the latter case. Pages are only stable when the query is
    /// ordered.
    pub async fn chunk<C, F>(&self, conn: &C, size: u64, mut f: F) -> QbResult<bool>
    where
        C: Connection,
        F: FnMut(Vec<Row>) -> bool,
    {
        if size == 0 {
            return Ok(true);
        }
        let mut page = 1;
        loop {
            let mut query = self.clone();
            query.for_page(page, size);
            let rows = query.get(conn).await?;
            let count = rows.len() as u64;
            if count == 0 {
                break;
            }
            if !f(rows) {
                return Ok(false);
            }
            if count < size {
                break;
            }
            page += 1;
        }
        Ok(true)
    }

    /// Whether the SELECT matches any row.
    pub async fn exists<C: Connection>(&self, conn: &C) -> QbResult<bool> {
        let sql = self.grammar.compile_exists(&self.query)?;
        let bindings = self.get_bindings();
        log_statement("exists", &sql, &bindings);
        let rows = conn.select(&sql, &bindings).await?;
        match rows.first() {
            Some(row) => row.try_get("exists"),
            None => Ok(false),
        }
    }

    pub async fn doesnt_exist<C: Connection>(&self, conn: &C) -> QbResult<bool> {
        Ok(!self.exists(conn).await?)
    }

    // ==================== Aggregates ====================

    /// The query used to evaluate an aggregate.
    ///
    /// Columns and select bindings are stripped unless unions or havings are
    /// present; a union aggregate wraps the whole compound query, and havings
    /// may refer to selected aliases.
    pub fn aggregate_query<I, C>(&self, function: &str, columns: I) -> QueryBuilder
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        let keep_columns = !self.query.unions.is_empty() || !self.query.havings.is_empty();
        let mut snapshot = if keep_columns {
            self.clone()
        } else {
            let mut snapshot = self.snapshot_without(&[Component::Columns]);
            snapshot.query.bindings.clear(BindingKind::Select);
            snapshot
        };
        snapshot.query.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        snapshot
    }

    /// Run an aggregate and return its value.
    pub async fn aggregate<I, C, Conn>(
        &self,
        conn: &Conn,
        function: &str,
        columns: I,
    ) -> QbResult<Option<Value>>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
        Conn: Connection,
    {
        let rows = self.aggregate_query(function, columns).get(conn).await?;
        Ok(rows.first().and_then(|row| row.get("aggregate").cloned()))
    }

    pub async fn count<C: Connection>(&self, conn: &C) -> QbResult<i64> {
        match self.aggregate(conn, "count", ["*"]).await? {
            Some(value) => i64::from_value(&value).map_err(|m| QbError::decode("aggregate", m)),
            None => Ok(0),
        }
    }

    pub async fn min<C: Connection>(
        &self,
        conn: &C,
        column: impl Into<ColumnRef>,
    ) -> QbResult<Option<Value>> {
        self.aggregate(conn, "min", [column]).await
    }

    pub async fn max<C: Connection>(
        &self,
        conn: &C,
        column: impl Into<ColumnRef>,
    ) -> QbResult<Option<Value>> {
        self.aggregate(conn, "max", [column]).await
    }

    /// Sum of `column`; an empty set sums to zero.
    pub async fn sum<C: Connection>(&self, conn: &C, column: impl Into<ColumnRef>) -> QbResult<Value> {
        Ok(match self.aggregate(conn, "sum", [column]).await? {
            Some(Value::Null) | None => Value::Int(0),
            Some(value) => value,
        })
    }

    pub async fn avg<C: Connection>(
        &self,
        conn: &C,
        column: impl Into<ColumnRef>,
    ) -> QbResult<Option<Value>> {
        self.aggregate(conn, "avg", [column]).await
    }

    // ==================== INSERT ====================

    /// Compile an INSERT. Several records are sorted by column name and must
    /// share one column list.
    pub fn compile_insert(&self, records: Vec<Record>) -> QbResult<CompiledQuery> {
        let records = super::normalize_records(records)?;
        let sql = self.grammar.compile_insert(&self.query, &records)?;
        Ok(CompiledQuery::new(sql, flatten_records(&records)))
    }

    pub fn compile_insert_or_ignore(&self, records: Vec<Record>) -> QbResult<CompiledQuery> {
        let records = super::normalize_records(records)?;
        let sql = self.grammar.compile_insert_or_ignore(&self.query, &records)?;
        Ok(CompiledQuery::new(sql, flatten_records(&records)))
    }

    pub fn compile_insert_get_id(
        &self,
        record: &Record,
        sequence: Option<&str>,
    ) -> QbResult<CompiledQuery> {
        let sql = self
            .grammar
            .compile_insert_get_id(&self.query, record, sequence)?;
        Ok(CompiledQuery::new(sql, record.bindings().collect()))
    }

    pub fn compile_insert_using<I, C>(
        &self,
        columns: I,
        query: &QueryBuilder,
    ) -> QbResult<CompiledQuery>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        let columns: Vec<ColumnRef> = columns.into_iter().map(Into::into).collect();
        let select = query.to_sql()?;
        let sql = self
            .grammar
            .compile_insert_using(&self.query, &columns, &select)?;
        Ok(CompiledQuery::new(sql, query.get_bindings()))
    }

    /// Insert one record. An empty record is a successful no-op.
    pub async fn insert<C: Connection>(&self, conn: &C, record: Record) -> QbResult<bool> {
        if record.is_empty() {
            return Ok(true);
        }
        self.insert_many(conn, vec![record]).await
    }

    /// Insert several records in one statement. An empty list is a successful no-op.
    pub async fn insert_many<C: Connection>(&self, conn: &C, records: Vec<Record>) -> QbResult<bool> {
        if records.is_empty() {
            return Ok(true);
        }
        let compiled = self.compile_insert(records)?;
        log_statement("insert", &compiled.sql, &compiled.bindings);
        conn.insert(&compiled.sql, &compiled.bindings).await
    }

    /// Insert, skipping rows that violate a unique constraint. Returns the rows inserted.
    pub async fn insert_or_ignore<C: Connection>(
        &self,
        conn: &C,
        records: Vec<Record>,
    ) -> QbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let compiled = self.compile_insert_or_ignore(records)?;
        log_statement("insert", &compiled.sql, &compiled.bindings);
        conn.affecting_statement(&compiled.sql, &compiled.bindings)
            .await
    }

    /// Insert one record and return its generated key.
    pub async fn insert_get_id<C: Connection>(
        &self,
        conn: &C,
        record: Record,
        sequence: Option<&str>,
    ) -> QbResult<i64> {
        let compiled = self.compile_insert_get_id(&record, sequence)?;
        log_statement("insert", &compiled.sql, &compiled.bindings);
        match self.grammar.dialect() {
            Dialect::Postgres => {
                let rows = conn.select(&compiled.sql, &compiled.bindings).await?;
                conn.processor()
                    .process_insert_get_id(&rows, sequence.unwrap_or("id"))
            }
            Dialect::MySql | Dialect::Sqlite => {
                conn.insert(&compiled.sql, &compiled.bindings).await?;
                conn.last_insert_id().await
            }
        }
    }

    /// `INSERT INTO table (columns) SELECT ...`; returns the rows inserted.
    pub async fn insert_using<I, C, Conn>(
        &self,
        conn: &Conn,
        columns: I,
        query: &QueryBuilder,
    ) -> QbResult<u64>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
        Conn: Connection,
    {
        let compiled = self.compile_insert_using(columns, query)?;
        log_statement("insert", &compiled.sql, &compiled.bindings);
        conn.affecting_statement(&compiled.sql, &compiled.bindings)
            .await
    }

    // ==================== UPDATE ====================

    pub fn compile_update(&self, record: &Record) -> QbResult<CompiledQuery> {
        let sql = self.grammar.compile_update(&self.query, record)?;
        let bindings = self.grammar.prepare_bindings_for_update(&self.query, record);
        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Update the matched rows; returns the number of rows affected.
    pub async fn update<C: Connection>(&self, conn: &C, record: Record) -> QbResult<u64> {
        let compiled = self.compile_update(&record)?;
        log_statement("update", &compiled.sql, &compiled.bindings);
        conn.update(&compiled.sql, &compiled.bindings).await
    }

    /// `column = column + amount`, plus any `extra` assignments.
    pub async fn increment<C: Connection>(
        &self,
        conn: &C,
        column: &str,
        amount: i64,
        extra: Record,
    ) -> QbResult<u64> {
        self.update(conn, self.step_record(column, amount, "+", extra))
            .await
    }

    /// `column = column - amount`, plus any `extra` assignments.
    pub async fn decrement<C: Connection>(
        &self,
        conn: &C,
        column: &str,
        amount: i64,
        extra: Record,
    ) -> QbResult<u64> {
        self.update(conn, self.step_record(column, amount, "-", extra))
            .await
    }

    fn step_record(&self, column: &str, amount: i64, sign: &str, extra: Record) -> Record {
        let wrapped = self.grammar.wrap(column);
        let mut record = Record::new().set(column, raw(format!("{wrapped} {sign} {amount}")));
        for (name, value) in extra.iter() {
            record.insert(name, value.clone());
        }
        record
    }

    // ==================== DELETE ====================

    pub fn compile_delete(&self) -> QbResult<CompiledQuery> {
        let sql = self.grammar.compile_delete(&self.query)?;
        let bindings = self.grammar.prepare_bindings_for_delete(&self.query);
        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Delete the matched rows; returns the number of rows affected.
    ///
    /// Without any where clause this deletes every row of the table.
    pub async fn delete<C: Connection>(&self, conn: &C) -> QbResult<u64> {
        let compiled = self.compile_delete()?;
        log_statement("delete", &compiled.sql, &compiled.bindings);
        conn.delete(&compiled.sql, &compiled.bindings).await
    }

    /// Delete the row whose `id` equals `id`.
    pub async fn delete_by_id<C: Connection>(&self, conn: &C, id: impl Into<Value>) -> QbResult<u64> {
        let mut query = self.clone();
        query.where_eq(self.id_column(), id.into());
        query.delete(conn).await
    }

    pub fn compile_truncate(&self) -> QbResult<Vec<CompiledQuery>> {
        self.grammar.compile_truncate(&self.query)
    }

    /// Empty the table and reset its identity counter.
    pub async fn truncate<C: Connection>(&self, conn: &C) -> QbResult<()> {
        for compiled in self.compile_truncate()? {
            log_statement("truncate", &compiled.sql, &compiled.bindings);
            conn.statement(&compiled.sql, &compiled.bindings).await?;
        }
        Ok(())
    }

    /// `table.id` for a plain table, bare `id` otherwise.
    fn id_column(&self) -> String {
        match &self.query.from {
            Some(TableRef::Name(name)) if ident::split_alias(name).is_none() => format!("{name}.id"),
            _ => "id".to_string(),
        }
    }
}

fn flatten_records(records: &[Record]) -> Vec<Value> {
    records.iter().flat_map(|r| r.bindings()).collect()
}

/// Key a selected column appears under in result rows.
fn result_key(column: &str) -> &str {
    match ident::split_alias(column) {
        Some((_, alias)) => alias,
        None => column.rsplit('.').next().unwrap_or(column),
    }
}
