//! Column list, source, grouping, ordering, paging, unions and locks.

use super::{
    BindingKind, Boolean, ColumnRef, Direction, Lock, OrderNode, QueryBuilder, Subquery, TableRef,
    UnionPart, WhereKind, WhereNode,
};
use crate::error::QbResult;
use crate::expression::Expression;
use crate::value::{Param, Value};

impl QueryBuilder {
    // ==================== SELECT columns ====================

    /// Replace the column list. Clears the select bucket.
    pub fn select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.query.columns = columns.into_iter().map(Into::into).collect();
        self.query.bindings.clear(BindingKind::Select);
        self
    }

    /// Append columns to the column list.
    pub fn add_select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.query
            .columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a raw column expression with its bindings.
    pub fn select_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.query.columns.push(ColumnRef::Raw(Expression::new(sql)));
        self.query.bindings.extend(BindingKind::Select, bindings);
        self
    }

    /// Append `(subquery) AS alias` to the column list.
    pub fn select_sub(&mut self, sub: impl Into<Subquery>, alias: &str) -> QbResult<&mut Self> {
        let (sql, bindings) = self.create_sub(sub.into())?;
        let column = format!("({sql}) AS {}", self.grammar.wrap(alias));
        self.query.columns.push(ColumnRef::Raw(Expression::new(column)));
        self.query.bindings.extend(BindingKind::Select, bindings);
        Ok(self)
    }

    /// [`QueryBuilder::select_sub`] with a builder-configuring callback.
    pub fn select_sub_with<F>(&mut self, alias: &str, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        self.select_sub(sub, alias)
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.query.distinct = true;
        self
    }

    // ==================== FROM ====================

    pub fn from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.query.from = Some(table.into());
        self
    }

    /// Raw FROM fragment with its bindings.
    pub fn from_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.query.from = Some(TableRef::Raw(Expression::new(sql)));
        self.query.bindings.extend(BindingKind::From, bindings);
        self
    }

    /// FROM `(subquery) AS alias`.
    pub fn from_sub(&mut self, sub: impl Into<Subquery>, alias: &str) -> QbResult<&mut Self> {
        let (sql, bindings) = self.create_sub(sub.into())?;
        let table = format!("({sql}) AS {}", self.grammar.wrap_table(alias));
        Ok(self.from_raw(&table, bindings))
    }

    /// [`QueryBuilder::from_sub`] with a builder-configuring callback.
    pub fn from_sub_with<F>(&mut self, alias: &str, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        self.from_sub(sub, alias)
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.query
            .groups
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Raw GROUP BY fragment. There is no group bucket, so it takes no bindings.
    pub fn group_by_raw(&mut self, sql: &str) -> &mut Self {
        self.query.groups.push(ColumnRef::Raw(Expression::new(sql)));
        self
    }

    pub fn having(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_having(column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_having(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_having(column.into(), operator, value.into(), Boolean::Or)
    }

    fn add_having(
        &mut self,
        column: ColumnRef,
        operator: &str,
        value: Param,
        boolean: Boolean,
    ) -> QbResult<&mut Self> {
        self.check_operator(operator)?;
        let kind = match self.null_comparison(&column, operator, &value)? {
            Some(kind) => kind,
            None => {
                self.bind(BindingKind::Having, &value);
                WhereKind::Basic {
                    column,
                    operator: operator.to_string(),
                    value,
                }
            }
        };
        self.query.havings.push(WhereNode::new(kind, boolean));
        Ok(self)
    }

    pub fn having_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.add_having_raw(sql, bindings, Boolean::And)
    }

    pub fn or_having_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.add_having_raw(sql, bindings, Boolean::Or)
    }

    fn add_having_raw<I>(&mut self, sql: &str, bindings: I, boolean: Boolean) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.query.havings.push(WhereNode::new(
            WhereKind::Raw {
                sql: sql.to_string(),
            },
            boolean,
        ));
        self.query.bindings.extend(BindingKind::Having, bindings);
        self
    }

    pub fn having_between(
        &mut self,
        column: impl Into<ColumnRef>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        let (low, high) = (low.into(), high.into());
        self.bind(BindingKind::Having, &low);
        self.bind(BindingKind::Having, &high);
        self.query.havings.push(WhereNode::new(
            WhereKind::Between {
                column: column.into(),
                low,
                high,
                negated: false,
            },
            Boolean::And,
        ));
        self
    }

    // ==================== ORDER BY ====================

    /// Add an ordering. After a union it orders the whole compound result.
    pub fn order_by(&mut self, column: impl Into<ColumnRef>, direction: Direction) -> &mut Self {
        self.push_order(OrderNode::Column {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn order_by_desc(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.order_by(column, Direction::Desc)
    }

    /// Newest first.
    pub fn latest(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.order_by(column, Direction::Desc)
    }

    /// Oldest first.
    pub fn oldest(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        let bindings: Vec<Value> = bindings.into_iter().collect();
        if self.query.unions.is_empty() {
            self.query.bindings.extend(BindingKind::Order, bindings);
            self.query.orders.push(OrderNode::Raw {
                sql: sql.to_string(),
                bindings: Vec::new(),
            });
        } else {
            // Rendered after the union block, so the values travel with the node.
            self.query.union_orders.push(OrderNode::Raw {
                sql: sql.to_string(),
                bindings,
            });
        }
        self
    }

    pub fn in_random_order(&mut self, seed: Option<u64>) -> &mut Self {
        let sql = self.grammar.compile_random(seed);
        self.order_by_raw(&sql, [])
    }

    /// Drop every ordering and the order bucket.
    pub fn reorder(&mut self) -> &mut Self {
        self.query.orders.clear();
        self.query.union_orders.clear();
        self.query.bindings.clear(BindingKind::Order);
        self
    }

    fn push_order(&mut self, order: OrderNode) {
        if self.query.unions.is_empty() {
            self.query.orders.push(order);
        } else {
            self.query.union_orders.push(order);
        }
    }

    // ==================== LIMIT / OFFSET ====================

    /// Negative values leave the builder unchanged.
    pub fn limit(&mut self, value: i64) -> &mut Self {
        if let Ok(value) = u64::try_from(value) {
            if self.query.unions.is_empty() {
                self.query.limit = Some(value);
            } else {
                self.query.union_limit = Some(value);
            }
        }
        self
    }

    pub fn take(&mut self, value: i64) -> &mut Self {
        self.limit(value)
    }

    /// Negative values clamp to zero.
    pub fn offset(&mut self, value: i64) -> &mut Self {
        let value = u64::try_from(value).unwrap_or(0);
        if self.query.unions.is_empty() {
            self.query.offset = Some(value);
        } else {
            self.query.union_offset = Some(value);
        }
        self
    }

    pub fn skip(&mut self, value: i64) -> &mut Self {
        self.offset(value)
    }

    /// Limit and offset for a 1-based page number.
    pub fn for_page(&mut self, page: u64, per_page: u64) -> &mut Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.offset(i64::try_from(offset).unwrap_or(i64::MAX))
            .limit(i64::try_from(per_page).unwrap_or(i64::MAX))
    }

    // ==================== UNION ====================

    pub fn union(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_union(query, false)
    }

    pub fn union_all(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_union(query, true)
    }

    pub fn union_with<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_union(sub, false))
    }

    pub fn union_all_with<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_union(sub, true))
    }

    fn add_union(&mut self, query: QueryBuilder, all: bool) -> &mut Self {
        self.query
            .bindings
            .extend(BindingKind::Union, query.get_bindings());
        self.query.unions.push(UnionPart {
            query: Box::new(query.query),
            all,
        });
        self
    }

    // ==================== Locking ====================

    pub fn lock(&mut self, lock: Lock) -> &mut Self {
        self.query.lock = Some(lock);
        self
    }

    pub fn lock_for_update(&mut self) -> &mut Self {
        self.lock(Lock::Update)
    }

    pub fn shared_lock(&mut self) -> &mut Self {
        self.lock(Lock::Shared)
    }
}
