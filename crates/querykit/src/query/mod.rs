//! Fluent DML builder.
//!
//! A [`QueryBuilder`] owns one [`QueryObj`] and a shared [`QueryGrammar`].
//! Every method appends clause nodes to the AST and records literal values in
//! the binding bucket of the clause family they belong to, so the flattened
//! bindings always line up with the placeholders the grammar emits, whatever
//! order the methods were called in.
//!
//! Sub-builders (nested groups, join conditions, subqueries, union members)
//! are created by the parent, handed to a callback, and merged back before the
//! parent method returns.
//!
//! # Example
//!
//! ```ignore
//! use querykit::prelude::*;
//! use std::sync::Arc;
//!
//! let grammar = Arc::new(QueryGrammar::new(Dialect::Postgres));
//! let mut q = QueryBuilder::table(grammar, "users");
//! q.select(["id", "email"])
//!     .where_eq("active", true)
//!     .where_nested(|q| {
//!         q.where_("votes", ">", 100)?.or_where_eq("name", "admin");
//!         Ok(())
//!     })?
//!     .order_by_desc("created_at")
//!     .limit(10);
//!
//! let compiled = q.to_compiled()?;
//! assert_eq!(compiled.bindings.len(), 3);
//! ```

mod ast;
mod bindings;
mod exec;
mod joins;
mod record;
mod select;
mod wheres;

#[cfg(test)]
mod tests;

pub use ast::{
    Aggregate, Boolean, ColumnRef, Component, DatePart, Direction, JoinClause, JoinType, Lock,
    OrderNode, QueryObj, TableRef, UnionPart, WhereKind, WhereNode,
};
pub use bindings::{BindingKind, Bindings};
pub use joins::JoinBuilder;
pub use record::Record;

pub(crate) use record::normalize_records;

use crate::error::{QbError, QbResult};
use crate::expression::Expression;
use crate::grammar::{CompiledQuery, QueryGrammar};
use crate::value::Value;
use std::sync::Arc;

/// Source of a subquery: another builder or literal SQL.
#[derive(Debug, Clone)]
pub enum Subquery {
    Builder(QueryBuilder),
    Raw(String),
}

impl From<QueryBuilder> for Subquery {
    fn from(value: QueryBuilder) -> Self {
        Subquery::Builder(value)
    }
}

impl From<&str> for Subquery {
    fn from(value: &str) -> Self {
        Subquery::Raw(value.to_string())
    }
}

impl From<String> for Subquery {
    fn from(value: String) -> Self {
        Subquery::Raw(value)
    }
}

impl From<Expression> for Subquery {
    fn from(value: Expression) -> Self {
        Subquery::Raw(value.into_inner())
    }
}

/// Fluent builder over one statement AST.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    grammar: Arc<QueryGrammar>,
    query: QueryObj,
}

impl QueryBuilder {
    /// Create an empty builder.
    pub fn new(grammar: Arc<QueryGrammar>) -> Self {
        Self {
            grammar,
            query: QueryObj::new(),
        }
    }

    /// Create a builder selecting from `table`.
    pub fn table(grammar: Arc<QueryGrammar>, table: impl Into<TableRef>) -> Self {
        let mut builder = Self::new(grammar);
        builder.query.from = Some(table.into());
        builder
    }

    /// A fresh builder sharing this builder's grammar.
    pub fn new_query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.grammar))
    }

    /// A fresh builder scoped to this builder's table, used for nested groups.
    pub(crate) fn for_nested_where(&self) -> QueryBuilder {
        let mut nested = self.new_query();
        nested.query.from = self.query.from.clone();
        nested
    }

    pub fn grammar(&self) -> &QueryGrammar {
        &self.grammar
    }

    pub(crate) fn grammar_arc(&self) -> &Arc<QueryGrammar> {
        &self.grammar
    }

    /// The statement AST.
    pub fn query(&self) -> &QueryObj {
        &self.query
    }

    pub fn into_query(self) -> QueryObj {
        self.query
    }

    /// Apply `f` only when `condition` holds.
    pub fn when<F>(&mut self, condition: bool, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        if condition {
            f(self)?;
        }
        Ok(self)
    }

    // ==================== Compilation ====================

    /// Compile to SQL text. Bindings are not touched.
    pub fn to_sql(&self) -> QbResult<String> {
        self.grammar.compile_select(&self.query)
    }

    /// Compile to SQL text plus flattened bindings.
    pub fn to_compiled(&self) -> QbResult<CompiledQuery> {
        Ok(CompiledQuery::new(self.to_sql()?, self.get_bindings()))
    }

    /// Bindings in placeholder order.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.query.flat_bindings()
    }

    /// The bucket map, unflattened.
    pub fn raw_bindings(&self) -> &Bindings {
        &self.query.bindings
    }

    // ==================== Bindings ====================

    /// Append a value to a bucket.
    pub fn add_binding(&mut self, value: impl Into<Value>, kind: BindingKind) -> &mut Self {
        self.query.bindings.push(kind, value.into());
        self
    }

    /// Append several values to a bucket.
    pub fn add_bindings<I>(&mut self, values: I, kind: BindingKind) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.query.bindings.extend(kind, values);
        self
    }

    /// Replace a bucket.
    pub fn set_bindings(&mut self, values: Vec<Value>, kind: BindingKind) -> &mut Self {
        self.query.bindings.set(kind, values);
        self
    }

    /// Append every bucket of `other` to the matching bucket of this builder.
    pub fn merge_bindings(&mut self, other: &QueryBuilder) -> &mut Self {
        for (kind, values) in other.query.bindings.iter() {
            self.query.bindings.extend(kind, values.iter().cloned());
        }
        self
    }

    // ==================== Snapshots ====================

    /// Deep copy of this builder with the given components reset.
    ///
    /// The copy shares nothing mutable with `self`; nested groups and
    /// subqueries are copied too.
    pub fn snapshot_without(&self, components: &[Component]) -> QueryBuilder {
        let mut snapshot = self.clone();
        for component in components {
            snapshot.query.clear(*component);
        }
        snapshot
    }

    /// Deep copy of this builder with the given buckets emptied.
    pub fn without_bindings(&self, kinds: &[BindingKind]) -> QueryBuilder {
        let mut snapshot = self.clone();
        for kind in kinds {
            snapshot.query.bindings.clear(*kind);
        }
        snapshot
    }

    // ==================== Subqueries ====================

    /// Render a subquery for splicing: its SQL and its flattened bindings.
    pub(crate) fn create_sub(&self, sub: Subquery) -> QbResult<(String, Vec<Value>)> {
        match sub {
            Subquery::Builder(builder) => {
                let sql = builder.to_sql()?;
                Ok((sql, builder.get_bindings()))
            }
            Subquery::Raw(sql) => {
                if sql.trim().is_empty() {
                    return Err(QbError::InvalidSubquery("empty subquery".to_string()));
                }
                Ok((sql, Vec::new()))
            }
        }
    }

    /// Run `f` against a fresh builder and return it.
    pub(crate) fn build_sub<F>(&self, f: F) -> QbResult<QueryBuilder>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let mut sub = self.new_query();
        f(&mut sub)?;
        Ok(sub)
    }
}
