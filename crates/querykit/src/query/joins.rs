//! JOIN clauses.
//!
//! A join's ON conditions are the where tree of its own sub-builder, so every
//! where method is available inside a join callback alongside [`JoinBuilder::on`].
//! Joins added inside the callback nest: `JOIN (a JOIN b ON ...) ON ...`.
//! The join and where bindings of the callback go to the join bucket of the parent.

use super::{
    BindingKind, Boolean, ColumnRef, JoinClause, JoinType, QueryBuilder, Subquery, TableRef,
};
use crate::error::QbResult;
use crate::expression::Expression;
use crate::value::Param;
use std::ops::{Deref, DerefMut};

/// Sub-builder for the ON clause of one join.
#[derive(Debug)]
pub struct JoinBuilder {
    inner: QueryBuilder,
}

impl JoinBuilder {
    /// `first operator second` between two columns.
    pub fn on(
        &mut self,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.inner
            .add_where_column(first.into(), operator, second.into(), Boolean::And)?;
        Ok(self)
    }

    pub fn or_on(
        &mut self,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.inner
            .add_where_column(first.into(), operator, second.into(), Boolean::Or)?;
        Ok(self)
    }
}

impl Deref for JoinBuilder {
    type Target = QueryBuilder;

    fn deref(&self) -> &QueryBuilder {
        &self.inner
    }
}

impl DerefMut for JoinBuilder {
    fn deref_mut(&mut self) -> &mut QueryBuilder {
        &mut self.inner
    }
}

impl QueryBuilder {
    // ==================== INNER ====================

    /// `INNER JOIN table ON first operator second`.
    pub fn join(
        &mut self,
        table: impl Into<TableRef>,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.join_on(JoinType::Inner, table.into(), first.into(), operator, second.into())
    }

    /// INNER JOIN whose ON clause is built by `f`.
    pub fn join_with<F>(&mut self, table: impl Into<TableRef>, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut JoinBuilder) -> QbResult<()>,
    {
        self.add_join(JoinType::Inner, table.into(), f)
    }

    /// `INNER JOIN table ON first operator ?`.
    pub fn join_where(
        &mut self,
        table: impl Into<TableRef>,
        first: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.join_on_value(JoinType::Inner, table.into(), first.into(), operator, value.into())
    }

    // ==================== LEFT / RIGHT ====================

    pub fn left_join(
        &mut self,
        table: impl Into<TableRef>,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.join_on(JoinType::Left, table.into(), first.into(), operator, second.into())
    }

    pub fn left_join_with<F>(&mut self, table: impl Into<TableRef>, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut JoinBuilder) -> QbResult<()>,
    {
        self.add_join(JoinType::Left, table.into(), f)
    }

    pub fn left_join_where(
        &mut self,
        table: impl Into<TableRef>,
        first: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.join_on_value(JoinType::Left, table.into(), first.into(), operator, value.into())
    }

    pub fn right_join(
        &mut self,
        table: impl Into<TableRef>,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.join_on(JoinType::Right, table.into(), first.into(), operator, second.into())
    }

    pub fn right_join_with<F>(&mut self, table: impl Into<TableRef>, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut JoinBuilder) -> QbResult<()>,
    {
        self.add_join(JoinType::Right, table.into(), f)
    }

    // ==================== CROSS ====================

    /// `CROSS JOIN table`.
    pub fn cross_join(&mut self, table: impl Into<TableRef>) -> &mut Self {
        let query = self.new_query().query;
        self.query.joins.push(JoinClause {
            kind: JoinType::Cross,
            table: table.into(),
            query,
        });
        self
    }

    /// `CROSS JOIN (subquery) AS alias`.
    pub fn cross_join_sub(&mut self, sub: impl Into<Subquery>, alias: &str) -> QbResult<&mut Self> {
        let table = self.sub_table(sub.into(), alias)?;
        Ok(self.cross_join(table))
    }

    // ==================== Subquery joins ====================

    /// `INNER JOIN (subquery) AS alias ON first operator second`.
    pub fn join_sub(
        &mut self,
        sub: impl Into<Subquery>,
        alias: &str,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        let table = self.sub_table(sub.into(), alias)?;
        self.join_on(JoinType::Inner, table, first.into(), operator, second.into())
    }

    pub fn left_join_sub(
        &mut self,
        sub: impl Into<Subquery>,
        alias: &str,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        let table = self.sub_table(sub.into(), alias)?;
        self.join_on(JoinType::Left, table, first.into(), operator, second.into())
    }

    pub fn right_join_sub(
        &mut self,
        sub: impl Into<Subquery>,
        alias: &str,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        let table = self.sub_table(sub.into(), alias)?;
        self.join_on(JoinType::Right, table, first.into(), operator, second.into())
    }

    /// Render `(subquery) AS alias` and push the subquery's bindings into the join bucket.
    fn sub_table(&mut self, sub: Subquery, alias: &str) -> QbResult<TableRef> {
        let (sql, bindings) = self.create_sub(sub)?;
        self.query.bindings.extend(BindingKind::Join, bindings);
        Ok(TableRef::Raw(Expression::new(format!(
            "({sql}) AS {}",
            self.grammar.wrap_table(alias)
        ))))
    }

    // ==================== Internals ====================

    fn join_on(
        &mut self,
        kind: JoinType,
        table: TableRef,
        first: ColumnRef,
        operator: &str,
        second: ColumnRef,
    ) -> QbResult<&mut Self> {
        self.add_join(kind, table, |join| {
            join.on(first, operator, second)?;
            Ok(())
        })
    }

    fn join_on_value(
        &mut self,
        kind: JoinType,
        table: TableRef,
        first: ColumnRef,
        operator: &str,
        value: Param,
    ) -> QbResult<&mut Self> {
        self.add_join(kind, table, |join| {
            join.where_(first, operator, value)?;
            Ok(())
        })
    }

    fn add_join<F>(&mut self, kind: JoinType, table: TableRef, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut JoinBuilder) -> QbResult<()>,
    {
        let mut join = JoinBuilder {
            inner: self.new_query(),
        };
        f(&mut join)?;
        let query = join.inner.query;
        // Only nested joins and ON conditions are rendered for a join.
        self.query.bindings.extend(
            BindingKind::Join,
            query
                .bindings
                .flatten_only(&[BindingKind::Join, BindingKind::Where]),
        );
        self.query.joins.push(JoinClause { kind, table, query });
        Ok(self)
    }
}
