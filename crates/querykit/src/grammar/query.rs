//! DML compiler: renders a [`QueryObj`] to SQL text.
//!
//! SELECT components are emitted in [`Component::SELECT`] order. Binding
//! buckets are flattened in the same order, which is what keeps every `?`
//! aligned with its value.

use super::{Dialect, Grammar, mysql, postgres, sqlite};
use crate::error::{QbError, QbResult};
use crate::ident;
use crate::query::{
    Aggregate, BindingKind, ColumnRef, Component, JoinClause, OrderNode, QueryObj, Record,
    TableRef, WhereKind, WhereNode,
};
use crate::value::{Param, Value};
use std::fmt;
use std::ops::Deref;
use tracing::trace;

/// A compiled statement: SQL text plus its positional bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// SQL text without bindings.
    pub fn statement(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Compiler for SELECT/INSERT/UPDATE/DELETE statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGrammar {
    base: Grammar,
}

impl Deref for QueryGrammar {
    type Target = Grammar;

    fn deref(&self) -> &Grammar {
        &self.base
    }
}

impl From<Grammar> for QueryGrammar {
    fn from(base: Grammar) -> Self {
        Self { base }
    }
}

impl QueryGrammar {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            base: Grammar::new(dialect),
        }
    }

    pub fn with_table_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            base: self.base.with_table_prefix(prefix),
        }
    }

    pub fn base(&self) -> &Grammar {
        &self.base
    }

    // ==================== SELECT ====================

    /// Compile a SELECT statement.
    pub fn compile_select(&self, query: &QueryObj) -> QbResult<String> {
        let sql = self.select_sql(query)?;
        trace!(target: "querykit::grammar", dialect = %self.dialect(), sql = %sql, "compiled select");
        Ok(sql)
    }

    /// `SELECT EXISTS(...) AS "exists"`.
    pub fn compile_exists(&self, query: &QueryObj) -> QbResult<String> {
        let select = self.select_sql(query)?;
        let sql = format!("SELECT EXISTS({select}) AS {}", self.wrap("exists"));
        trace!(target: "querykit::grammar", dialect = %self.dialect(), sql = %sql, "compiled exists");
        Ok(sql)
    }

    fn select_sql(&self, query: &QueryObj) -> QbResult<String> {
        if query.has(Component::Unions) && query.aggregate.is_some() {
            return self.compile_union_aggregate(query);
        }

        let mut sql = String::new();
        for component in Component::SELECT {
            if !query.has(component) {
                continue;
            }
            let part = self.compile_component(query, component)?;
            if component == Component::Unions {
                // Everything emitted so far is the first union member.
                sql = format!("{} {part}", self.wrap_union(&sql));
                continue;
            }
            if part.is_empty() {
                continue;
            }
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&part);
        }
        Ok(sql)
    }

    fn compile_component(&self, query: &QueryObj, component: Component) -> QbResult<String> {
        match component {
            Component::Aggregate => Ok(query
                .aggregate
                .as_ref()
                .map(|agg| self.compile_aggregate(query, agg))
                .unwrap_or_default()),
            Component::Columns => Ok(self.compile_columns(query)),
            Component::From => Ok(query
                .from
                .as_ref()
                .map(|from| format!("FROM {}", self.wrap_table_ref(from)))
                .unwrap_or_default()),
            Component::Joins => self.compile_joins(&query.joins),
            Component::Wheres => self.compile_wheres(query),
            Component::Groups => Ok(format!("GROUP BY {}", self.columnize(&query.groups))),
            Component::Havings => Ok(format!(
                "HAVING {}",
                self.compile_conditions(&query.havings)?
            )),
            Component::Orders => Ok(self.compile_orders(&query.orders)),
            Component::Limit => Ok(query
                .limit
                .map(|limit| format!("LIMIT {limit}"))
                .unwrap_or_default()),
            Component::Offset => Ok(query
                .offset
                .map(|offset| self.compile_offset(offset, query.limit.is_some()))
                .unwrap_or_default()),
            Component::Unions => self.compile_unions(query),
            Component::Lock => Ok(query
                .lock
                .as_ref()
                .map(|lock| match self.dialect() {
                    Dialect::MySql => mysql::compile_lock(lock),
                    Dialect::Postgres => postgres::compile_lock(lock),
                    // SQLite locks the whole database file; there is no row lock clause.
                    Dialect::Sqlite => String::new(),
                })
                .unwrap_or_default()),
        }
    }

    fn compile_aggregate(&self, query: &QueryObj, aggregate: &Aggregate) -> String {
        let mut column = self.columnize(&aggregate.columns);
        if query.distinct && column != "*" {
            column = format!("DISTINCT {column}");
        }
        format!("SELECT {}({column}) AS aggregate", aggregate.function)
    }

    fn compile_columns(&self, query: &QueryObj) -> String {
        let select = if query.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        };
        format!("{select} {}", self.columnize(&query.columns))
    }

    fn compile_union_aggregate(&self, query: &QueryObj) -> QbResult<String> {
        let Some(aggregate) = &query.aggregate else {
            return self.select_sql(query);
        };
        let head = self.compile_aggregate(query, aggregate);
        let mut inner = query.clone();
        inner.aggregate = None;
        let inner = self.select_sql(&inner)?;
        Ok(format!(
            "{head} FROM ({inner}) AS {}",
            self.wrap_table("temp_table")
        ))
    }

    fn compile_joins(&self, joins: &[JoinClause]) -> QbResult<String> {
        let mut out = Vec::with_capacity(joins.len());
        for join in joins {
            let table = self.wrap_table_ref(&join.table);
            let mut sql = if join.query.joins.is_empty() {
                format!("{} JOIN {table}", join.kind.as_sql())
            } else {
                format!(
                    "{} JOIN ({table} {})",
                    join.kind.as_sql(),
                    self.compile_joins(&join.query.joins)?
                )
            };
            if !join.query.wheres.is_empty() {
                sql.push_str(" ON ");
                sql.push_str(&self.compile_conditions(&join.query.wheres)?);
            }
            out.push(sql);
        }
        Ok(out.join(" "))
    }

    fn compile_wheres(&self, query: &QueryObj) -> QbResult<String> {
        if query.wheres.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("WHERE {}", self.compile_conditions(&query.wheres)?))
    }

    /// Join condition fragments with their connectives, dropping the first one.
    fn compile_conditions(&self, nodes: &[WhereNode]) -> QbResult<String> {
        let mut sql = String::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(node.boolean.as_sql());
                sql.push(' ');
            }
            sql.push_str(&self.compile_where(&node.kind)?);
        }
        Ok(sql)
    }

    fn compile_where(&self, kind: &WhereKind) -> QbResult<String> {
        let sql = match kind {
            WhereKind::Basic {
                column,
                operator,
                value,
            } => {
                let mut column = self.wrap_column(column);
                if self.dialect() == Dialect::Postgres {
                    column = postgres::basic_column(column, operator);
                }
                format!("{column} {operator} {}", self.parameter(value))
            }
            WhereKind::Raw { sql } => sql.clone(),
            WhereKind::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    let constant = if *negated { "1 = 1" } else { "0 = 1" };
                    constant.to_string()
                } else {
                    format!(
                        "{} {} ({})",
                        self.wrap_column(column),
                        if *negated { "NOT IN" } else { "IN" },
                        self.parameterize(values)
                    )
                }
            }
            WhereKind::InSub {
                column,
                query,
                negated,
            } => format!(
                "{} {} ({})",
                self.wrap_column(column),
                if *negated { "NOT IN" } else { "IN" },
                self.select_sql(query)?
            ),
            WhereKind::Null { column, negated } => format!(
                "{} {}",
                self.wrap_column(column),
                if *negated { "IS NOT NULL" } else { "IS NULL" }
            ),
            WhereKind::Between {
                column,
                low,
                high,
                negated,
            } => format!(
                "{} {} {} AND {}",
                self.wrap_column(column),
                if *negated { "NOT BETWEEN" } else { "BETWEEN" },
                self.parameter(low),
                self.parameter(high)
            ),
            WhereKind::Nested { query } => {
                format!("({})", self.compile_conditions(&query.wheres)?)
            }
            WhereKind::Exists { query, negated } => format!(
                "{}EXISTS ({})",
                if *negated { "NOT " } else { "" },
                self.select_sql(query)?
            ),
            WhereKind::Column {
                first,
                operator,
                second,
            } => format!(
                "{} {operator} {}",
                self.wrap_column(first),
                self.wrap_column(second)
            ),
            WhereKind::Sub {
                column,
                operator,
                query,
            } => format!(
                "{} {operator} ({})",
                self.wrap_column(column),
                self.select_sql(query)?
            ),
            WhereKind::Date {
                part,
                column,
                operator,
                value,
            } => {
                let column = self.wrap_column(column);
                let value = self.parameter(value);
                match self.dialect() {
                    Dialect::MySql => mysql::date_where(*part, &column, operator, &value),
                    Dialect::Postgres => postgres::date_where(*part, &column, operator, &value),
                    Dialect::Sqlite => sqlite::date_where(*part, &column, operator, &value),
                }
            }
            WhereKind::RowValues {
                columns,
                operator,
                values,
            } => format!(
                "({}) {operator} ({})",
                self.columnize(columns),
                self.parameterize(values)
            ),
            WhereKind::JsonContains {
                column,
                value,
                negated,
            } => self.compile_json_contains(column, value, *negated)?,
        };
        Ok(sql)
    }

    fn compile_json_contains(
        &self,
        column: &ColumnRef,
        value: &Param,
        negated: bool,
    ) -> QbResult<String> {
        let value = self.parameter(value);
        match self.dialect() {
            Dialect::MySql => {
                let (field, path) = match column {
                    ColumnRef::Name(name) => match ident::split_json(name) {
                        Some((field, path)) => (self.wrap(field), Some(super::json_path(&path))),
                        None => (self.wrap(name), None),
                    },
                    ColumnRef::Raw(expr) => (expr.render().to_string(), None),
                };
                Ok(mysql::json_contains(
                    &field,
                    path.as_deref(),
                    &value,
                    negated,
                ))
            }
            Dialect::Postgres => Ok(postgres::json_contains(
                &self.wrap_column(column),
                &value,
                negated,
            )),
            Dialect::Sqlite => Err(QbError::unsupported(Dialect::Sqlite, "JSON containment")),
        }
    }

    fn compile_orders(&self, orders: &[OrderNode]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = orders
            .iter()
            .map(|order| match order {
                OrderNode::Column { column, direction } => {
                    format!("{} {}", self.wrap_column(column), direction.as_sql())
                }
                OrderNode::Raw { sql, .. } => sql.clone(),
            })
            .collect();
        format!("ORDER BY {}", rendered.join(", "))
    }

    fn compile_offset(&self, offset: u64, has_limit: bool) -> String {
        if has_limit {
            return format!("OFFSET {offset}");
        }
        match self.dialect() {
            Dialect::MySql => format!("LIMIT {} OFFSET {offset}", mysql::NO_LIMIT),
            Dialect::Postgres => format!("OFFSET {offset}"),
            Dialect::Sqlite => format!("LIMIT {} OFFSET {offset}", sqlite::NO_LIMIT),
        }
    }

    fn compile_unions(&self, query: &QueryObj) -> QbResult<String> {
        let mut parts = Vec::with_capacity(query.unions.len() + 3);
        for union in &query.unions {
            let member = self.select_sql(&union.query)?;
            let conjunction = if union.all { "UNION ALL" } else { "UNION" };
            parts.push(format!("{conjunction} {}", self.wrap_union(&member)));
        }
        if !query.union_orders.is_empty() {
            parts.push(self.compile_orders(&query.union_orders));
        }
        if let Some(limit) = query.union_limit {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(offset) = query.union_offset {
            parts.push(self.compile_offset(offset, query.union_limit.is_some()));
        }
        Ok(parts.join(" "))
    }

    fn wrap_union(&self, sql: &str) -> String {
        match self.dialect() {
            Dialect::MySql => mysql::wrap_union(sql),
            Dialect::Postgres => postgres::wrap_union(sql),
            Dialect::Sqlite => sqlite::wrap_union(sql),
        }
    }

    /// Render an ORDER BY expression that shuffles rows.
    pub fn compile_random(&self, seed: Option<u64>) -> String {
        match self.dialect() {
            Dialect::MySql => mysql::compile_random(seed),
            Dialect::Postgres | Dialect::Sqlite => "RANDOM()".to_string(),
        }
    }

    // ==================== INSERT ====================

    /// Compile an INSERT of one or more records sharing a column list.
    pub fn compile_insert(&self, query: &QueryObj, records: &[Record]) -> QbResult<String> {
        let table = self.target_table(query, "insert")?;
        let sql = match records.first() {
            None => match self.dialect() {
                Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => {
                    format!("INSERT INTO {table} DEFAULT VALUES")
                }
            },
            Some(first) => {
                let columns: Vec<String> = first.columns().map(|c| self.wrap(c)).collect();
                let rows: Vec<String> = records
                    .iter()
                    .map(|record| {
                        let params: Vec<String> =
                            record.params().map(|p| self.parameter(p)).collect();
                        format!("({})", params.join(", "))
                    })
                    .collect();
                format!(
                    "INSERT INTO {table} ({}) VALUES {}",
                    columns.join(", "),
                    rows.join(", ")
                )
            }
        };
        trace!(target: "querykit::grammar", dialect = %self.dialect(), sql = %sql, "compiled insert");
        Ok(sql)
    }

    /// INSERT that skips rows violating a unique constraint.
    pub fn compile_insert_or_ignore(
        &self,
        query: &QueryObj,
        records: &[Record],
    ) -> QbResult<String> {
        let insert = self.compile_insert(query, records)?;
        Ok(match self.dialect() {
            Dialect::MySql => mysql::insert_or_ignore(&insert),
            Dialect::Postgres => postgres::insert_or_ignore(&insert),
            Dialect::Sqlite => sqlite::insert_or_ignore(&insert),
        })
    }

    /// INSERT of one record; Postgres returns the generated key.
    pub fn compile_insert_get_id(
        &self,
        query: &QueryObj,
        record: &Record,
        sequence: Option<&str>,
    ) -> QbResult<String> {
        let insert = self.compile_insert(query, std::slice::from_ref(record))?;
        Ok(match self.dialect() {
            Dialect::Postgres => {
                format!("{insert} RETURNING {}", self.wrap(sequence.unwrap_or("id")))
            }
            Dialect::MySql | Dialect::Sqlite => insert,
        })
    }

    /// `INSERT INTO t (cols) SELECT ...`
    pub fn compile_insert_using(
        &self,
        query: &QueryObj,
        columns: &[ColumnRef],
        select_sql: &str,
    ) -> QbResult<String> {
        let table = self.target_table(query, "insert")?;
        Ok(format!(
            "INSERT INTO {table} ({}) {select_sql}",
            self.columnize(columns)
        ))
    }

    // ==================== UPDATE ====================

    /// Compile an UPDATE of `record` over the rows matched by `query`.
    pub fn compile_update(&self, query: &QueryObj, record: &Record) -> QbResult<String> {
        let table = self.target_table(query, "update")?;
        let columns = self.compile_update_columns(record);

        let sql = match self.dialect() {
            Dialect::MySql => {
                let mut parts = vec![format!("UPDATE {table}")];
                if !query.joins.is_empty() {
                    parts.push(self.compile_joins(&query.joins)?);
                }
                parts.push(format!("SET {columns}"));
                parts.push(self.compile_wheres(query)?);
                if query.joins.is_empty() {
                    parts.push(self.compile_orders(&query.orders));
                    if let Some(limit) = query.limit {
                        parts.push(format!("LIMIT {limit}"));
                    }
                }
                join_non_empty(parts)
            }
            Dialect::Postgres | Dialect::Sqlite => {
                if query.joins.is_empty() && query.limit.is_none() {
                    join_non_empty(vec![
                        format!("UPDATE {table} SET {columns}"),
                        self.compile_wheres(query)?,
                    ])
                } else {
                    let row_id = self.row_id();
                    format!(
                        "UPDATE {table} SET {columns} WHERE {} IN ({})",
                        self.wrap(row_id),
                        self.compile_row_id_select(query, row_id)?
                    )
                }
            }
        };
        trace!(target: "querykit::grammar", dialect = %self.dialect(), sql = %sql, "compiled update");
        Ok(sql)
    }

    fn compile_update_columns(&self, record: &Record) -> String {
        record
            .iter()
            .map(|(column, value)| {
                let column = match self.dialect() {
                    Dialect::MySql => self.wrap(column),
                    // SET targets cannot be qualified outside MySQL.
                    Dialect::Postgres | Dialect::Sqlite => {
                        self.wrap(column.rsplit('.').next().unwrap_or(column))
                    }
                };
                format!("{column} = {}", self.parameter(value))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Order the bindings of an UPDATE to match [`QueryGrammar::compile_update`].
    ///
    /// Only buckets of clauses the chosen UPDATE shape renders are bound.
    pub fn prepare_bindings_for_update(&self, query: &QueryObj, record: &Record) -> Vec<Value> {
        use BindingKind as K;

        let values = record.bindings();
        match self.dialect() {
            Dialect::MySql => {
                let mut out = query.bindings.flatten_only(&[K::From, K::Join]);
                out.extend(values);
                let tail: &[BindingKind] = if query.joins.is_empty() {
                    &[K::Where, K::Order]
                } else {
                    &[K::Where]
                };
                out.extend(query.bindings.flatten_only(tail));
                out
            }
            Dialect::Postgres | Dialect::Sqlite => {
                if query.joins.is_empty() && query.limit.is_none() {
                    let mut out = query.bindings.flatten_only(&[K::From]);
                    out.extend(values);
                    out.extend(query.bindings.flatten_only(&[K::Where]));
                    out
                } else {
                    let mut out: Vec<Value> = values.collect();
                    out.extend(query.bindings.flatten_except(&[K::Select]));
                    out.extend(query.union_order_bindings());
                    out
                }
            }
        }
    }

    // ==================== DELETE ====================

    /// Compile a DELETE over the rows matched by `query`.
    ///
    /// A query without wheres deletes every row of the table.
    pub fn compile_delete(&self, query: &QueryObj) -> QbResult<String> {
        let table = self.target_table(query, "delete")?;

        let sql = match self.dialect() {
            Dialect::MySql => {
                if query.joins.is_empty() {
                    let mut parts = vec![
                        format!("DELETE FROM {table}"),
                        self.compile_wheres(query)?,
                        self.compile_orders(&query.orders),
                    ];
                    if let Some(limit) = query.limit {
                        parts.push(format!("LIMIT {limit}"));
                    }
                    join_non_empty(parts)
                } else {
                    let alias = table
                        .split_once(" AS ")
                        .map(|(_, alias)| alias.to_string())
                        .unwrap_or_else(|| table.clone());
                    join_non_empty(vec![
                        format!("DELETE {alias} FROM {table}"),
                        self.compile_joins(&query.joins)?,
                        self.compile_wheres(query)?,
                    ])
                }
            }
            Dialect::Postgres | Dialect::Sqlite => {
                if query.joins.is_empty() && query.limit.is_none() {
                    join_non_empty(vec![
                        format!("DELETE FROM {table}"),
                        self.compile_wheres(query)?,
                    ])
                } else {
                    let row_id = self.row_id();
                    format!(
                        "DELETE FROM {table} WHERE {} IN ({})",
                        self.wrap(row_id),
                        self.compile_row_id_select(query, row_id)?
                    )
                }
            }
        };
        trace!(target: "querykit::grammar", dialect = %self.dialect(), sql = %sql, "compiled delete");
        Ok(sql)
    }

    /// Order the bindings of a DELETE to match [`QueryGrammar::compile_delete`].
    pub fn prepare_bindings_for_delete(&self, query: &QueryObj) -> Vec<Value> {
        use BindingKind as K;

        match self.dialect() {
            Dialect::MySql if query.joins.is_empty() => {
                query.bindings.flatten_only(&[K::From, K::Where, K::Order])
            }
            Dialect::MySql => query.bindings.flatten_only(&[K::From, K::Join, K::Where]),
            Dialect::Postgres | Dialect::Sqlite => {
                if query.joins.is_empty() && query.limit.is_none() {
                    query.bindings.flatten_only(&[K::From, K::Where])
                } else {
                    let mut out = query.bindings.flatten_except(&[K::Select]);
                    out.extend(query.union_order_bindings());
                    out
                }
            }
        }
    }

    fn row_id(&self) -> &'static str {
        match self.dialect() {
            Dialect::Postgres => postgres::ROW_ID,
            Dialect::MySql | Dialect::Sqlite => sqlite::ROW_ID,
        }
    }

    /// `SELECT alias.rowid FROM ...` used to target joined or limited rows.
    fn compile_row_id_select(&self, query: &QueryObj, row_id: &str) -> QbResult<String> {
        let alias = match &query.from {
            Some(TableRef::Name(name)) => ident::split_alias(name)
                .map(|(_, alias)| alias.to_string())
                .unwrap_or_else(|| name.clone()),
            _ => return Err(QbError::MissingTable("row id subselect")),
        };
        let mut inner = query.clone();
        inner.aggregate = None;
        inner.distinct = false;
        inner.columns = vec![ColumnRef::Name(format!("{alias}.{row_id}"))];
        self.select_sql(&inner)
    }

    // ==================== TRUNCATE ====================

    /// Statements that empty the table and reset its identity.
    pub fn compile_truncate(&self, query: &QueryObj) -> QbResult<Vec<CompiledQuery>> {
        let table = self.target_table(query, "truncate")?;
        Ok(match self.dialect() {
            Dialect::MySql => vec![CompiledQuery::statement(mysql::truncate(&table))],
            Dialect::Postgres => vec![CompiledQuery::statement(postgres::truncate(&table))],
            Dialect::Sqlite => {
                let name = match &query.from {
                    Some(TableRef::Name(name)) => format!("{}{}", self.table_prefix(), name),
                    _ => return Err(QbError::MissingTable("truncate")),
                };
                vec![
                    CompiledQuery::new(sqlite::reset_sequence(), vec![Value::Text(name)]),
                    CompiledQuery::statement(sqlite::truncate(&table)),
                ]
            }
        })
    }

    fn target_table(&self, query: &QueryObj, statement: &'static str) -> QbResult<String> {
        query
            .from
            .as_ref()
            .map(|from| self.wrap_table_ref(from))
            .ok_or(QbError::MissingTable(statement))
    }
}

fn join_non_empty(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
