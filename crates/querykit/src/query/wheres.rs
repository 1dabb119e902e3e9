//! WHERE clause methods.

use super::{
    BindingKind, Boolean, ColumnRef, DatePart, QueryBuilder, QueryObj, WhereKind, WhereNode,
};
use crate::error::{QbError, QbResult};
use crate::value::{Param, Value};

impl QueryBuilder {
    // ==================== Internals ====================

    pub(crate) fn check_operator(&self, operator: &str) -> QbResult<()> {
        if self.grammar.is_valid_operator(operator) {
            Ok(())
        } else {
            Err(QbError::InvalidOperator(operator.to_string()))
        }
    }

    /// Rewrite a comparison against NULL: `=` becomes IS NULL, `<>`/`!=`
    /// becomes IS NOT NULL, anything else is rejected.
    pub(crate) fn null_comparison(
        &self,
        column: &ColumnRef,
        operator: &str,
        value: &Param,
    ) -> QbResult<Option<WhereKind>> {
        if !value.is_null() {
            return Ok(None);
        }
        let negated = match operator.trim() {
            "=" => false,
            "<>" | "!=" => true,
            other => {
                return Err(QbError::IllegalOperatorAndValue {
                    operator: other.to_string(),
                });
            }
        };
        Ok(Some(WhereKind::Null {
            column: column.clone(),
            negated,
        }))
    }

    /// Record `param` in `kind` unless it renders as raw SQL.
    pub(crate) fn bind(&mut self, kind: BindingKind, param: &Param) {
        if let Some(value) = param.as_value() {
            self.query.bindings.push(kind, value.clone());
        }
    }

    fn push_where(&mut self, kind: WhereKind, boolean: Boolean) -> &mut Self {
        self.query.wheres.push(WhereNode::new(kind, boolean));
        self
    }

    // ==================== Basic ====================

    /// `column operator ?`.
    ///
    /// A NULL value with `=` is rewritten to [`QueryBuilder::where_null`] and
    /// with `<>`/`!=` to [`QueryBuilder::where_not_null`]. An operator outside
    /// the dialect's whitelist is rejected with [`QbError::InvalidOperator`]
    /// rather than treated as a value; use [`QueryBuilder::where_eq`] for the
    /// two-argument form.
    pub fn where_(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_basic_where(column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_basic_where(column.into(), operator, value.into(), Boolean::Or)
    }

    /// `column = ?`, or `column IS NULL` for a NULL value.
    pub fn where_eq(&mut self, column: impl Into<ColumnRef>, value: impl Into<Param>) -> &mut Self {
        self.add_eq(column.into(), value.into(), Boolean::And)
    }

    pub fn or_where_eq(
        &mut self,
        column: impl Into<ColumnRef>,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.add_eq(column.into(), value.into(), Boolean::Or)
    }

    fn add_eq(&mut self, column: ColumnRef, value: Param, boolean: Boolean) -> &mut Self {
        if value.is_null() {
            return self.push_where(
                WhereKind::Null {
                    column,
                    negated: false,
                },
                boolean,
            );
        }
        self.bind(BindingKind::Where, &value);
        self.push_where(
            WhereKind::Basic {
                column,
                operator: "=".to_string(),
                value,
            },
            boolean,
        )
    }

    fn add_basic_where(
        &mut self,
        column: ColumnRef,
        operator: &str,
        value: Param,
        boolean: Boolean,
    ) -> QbResult<&mut Self> {
        self.check_operator(operator)?;
        if let Some(kind) = self.null_comparison(&column, operator, &value)? {
            return Ok(self.push_where(kind, boolean));
        }
        self.bind(BindingKind::Where, &value);
        Ok(self.push_where(
            WhereKind::Basic {
                column,
                operator: operator.to_string(),
                value,
            },
            boolean,
        ))
    }

    /// Nested AND group of `column = value` pairs.
    pub fn where_pairs<I, C, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<ColumnRef>,
        V: Into<Param>,
    {
        let mut nested = self.for_nested_where();
        for (column, value) in pairs {
            nested.where_eq(column, value);
        }
        self.add_nested_query(nested.query, Boolean::And);
        self
    }

    pub fn where_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.add_raw_where(sql, bindings, Boolean::And)
    }

    pub fn or_where_raw<I>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.add_raw_where(sql, bindings, Boolean::Or)
    }

    fn add_raw_where<I>(&mut self, sql: &str, bindings: I, boolean: Boolean) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.query.bindings.extend(BindingKind::Where, bindings);
        self.push_where(
            WhereKind::Raw {
                sql: sql.to_string(),
            },
            boolean,
        )
    }

    // ==================== Column comparison ====================

    /// `first operator second`; both sides are identifiers.
    pub fn where_column(
        &mut self,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.add_where_column(first.into(), operator, second.into(), Boolean::And)
    }

    pub fn or_where_column(
        &mut self,
        first: impl Into<ColumnRef>,
        operator: &str,
        second: impl Into<ColumnRef>,
    ) -> QbResult<&mut Self> {
        self.add_where_column(first.into(), operator, second.into(), Boolean::Or)
    }

    pub(crate) fn add_where_column(
        &mut self,
        first: ColumnRef,
        operator: &str,
        second: ColumnRef,
        boolean: Boolean,
    ) -> QbResult<&mut Self> {
        self.check_operator(operator)?;
        Ok(self.push_where(
            WhereKind::Column {
                first,
                operator: operator.to_string(),
                second,
            },
            boolean,
        ))
    }

    // ==================== IN ====================

    pub fn where_in<I, V>(&mut self, column: impl Into<ColumnRef>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.add_where_in(column.into(), values, false, Boolean::And)
    }

    pub fn or_where_in<I, V>(&mut self, column: impl Into<ColumnRef>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.add_where_in(column.into(), values, false, Boolean::Or)
    }

    pub fn where_not_in<I, V>(&mut self, column: impl Into<ColumnRef>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.add_where_in(column.into(), values, true, Boolean::And)
    }

    pub fn or_where_not_in<I, V>(&mut self, column: impl Into<ColumnRef>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.add_where_in(column.into(), values, true, Boolean::Or)
    }

    fn add_where_in<I, V>(
        &mut self,
        column: ColumnRef,
        values: I,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.bind(BindingKind::Where, value);
        }
        self.push_where(
            WhereKind::In {
                column,
                values,
                negated,
            },
            boolean,
        )
    }

    /// `column IN (SELECT ...)`.
    pub fn where_in_sub(&mut self, column: impl Into<ColumnRef>, query: QueryBuilder) -> &mut Self {
        self.add_where_in_sub(column.into(), query, false, Boolean::And)
    }

    pub fn where_not_in_sub(
        &mut self,
        column: impl Into<ColumnRef>,
        query: QueryBuilder,
    ) -> &mut Self {
        self.add_where_in_sub(column.into(), query, true, Boolean::And)
    }

    pub fn or_where_in_sub(
        &mut self,
        column: impl Into<ColumnRef>,
        query: QueryBuilder,
    ) -> &mut Self {
        self.add_where_in_sub(column.into(), query, false, Boolean::Or)
    }

    /// [`QueryBuilder::where_in_sub`] with a builder-configuring callback.
    pub fn where_in_with<F>(&mut self, column: impl Into<ColumnRef>, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_where_in_sub(column.into(), sub, false, Boolean::And))
    }

    pub fn where_not_in_with<F>(
        &mut self,
        column: impl Into<ColumnRef>,
        f: F,
    ) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_where_in_sub(column.into(), sub, true, Boolean::And))
    }

    fn add_where_in_sub(
        &mut self,
        column: ColumnRef,
        query: QueryBuilder,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        self.query
            .bindings
            .extend(BindingKind::Where, query.get_bindings());
        self.push_where(
            WhereKind::InSub {
                column,
                query: Box::new(query.query),
                negated,
            },
            boolean,
        )
    }

    // ==================== NULL ====================

    pub fn where_null(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.add_where_null(column.into(), false, Boolean::And)
    }

    pub fn or_where_null(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.add_where_null(column.into(), false, Boolean::Or)
    }

    pub fn where_not_null(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.add_where_null(column.into(), true, Boolean::And)
    }

    pub fn or_where_not_null(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.add_where_null(column.into(), true, Boolean::Or)
    }

    fn add_where_null(&mut self, column: ColumnRef, negated: bool, boolean: Boolean) -> &mut Self {
        self.push_where(WhereKind::Null { column, negated }, boolean)
    }

    // ==================== BETWEEN ====================

    pub fn where_between(
        &mut self,
        column: impl Into<ColumnRef>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.add_where_between(column.into(), low.into(), high.into(), false, Boolean::And)
    }

    pub fn or_where_between(
        &mut self,
        column: impl Into<ColumnRef>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.add_where_between(column.into(), low.into(), high.into(), false, Boolean::Or)
    }

    pub fn where_not_between(
        &mut self,
        column: impl Into<ColumnRef>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.add_where_between(column.into(), low.into(), high.into(), true, Boolean::And)
    }

    pub fn or_where_not_between(
        &mut self,
        column: impl Into<ColumnRef>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.add_where_between(column.into(), low.into(), high.into(), true, Boolean::Or)
    }

    fn add_where_between(
        &mut self,
        column: ColumnRef,
        low: Param,
        high: Param,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        self.bind(BindingKind::Where, &low);
        self.bind(BindingKind::Where, &high);
        self.push_where(
            WhereKind::Between {
                column,
                low,
                high,
                negated,
            },
            boolean,
        )
    }

    // ==================== Nested groups ====================

    /// Parenthesized AND group built by `f`. An empty group is dropped.
    pub fn where_nested<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        self.add_nested(f, Boolean::And)
    }

    /// Parenthesized OR group built by `f`.
    pub fn or_where_nested<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        self.add_nested(f, Boolean::Or)
    }

    fn add_nested<F>(&mut self, f: F, boolean: Boolean) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let mut nested = self.for_nested_where();
        f(&mut nested)?;
        self.add_nested_query(nested.query, boolean);
        Ok(self)
    }

    /// Merge a nested group: its where tree and where bucket only.
    pub(crate) fn add_nested_query(&mut self, query: QueryObj, boolean: Boolean) {
        if query.wheres.is_empty() {
            return;
        }
        self.query.bindings.extend(
            BindingKind::Where,
            query.bindings.get(BindingKind::Where).iter().cloned(),
        );
        self.push_where(
            WhereKind::Nested {
                query: Box::new(query),
            },
            boolean,
        );
    }

    // ==================== EXISTS ====================

    pub fn where_exists(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_exists(query, false, Boolean::And)
    }

    pub fn or_where_exists(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_exists(query, false, Boolean::Or)
    }

    pub fn where_not_exists(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_exists(query, true, Boolean::And)
    }

    pub fn or_where_not_exists(&mut self, query: QueryBuilder) -> &mut Self {
        self.add_exists(query, true, Boolean::Or)
    }

    /// [`QueryBuilder::where_exists`] with a builder-configuring callback.
    pub fn where_exists_with<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_exists(sub, false, Boolean::And))
    }

    pub fn where_not_exists_with<F>(&mut self, f: F) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        let sub = self.build_sub(f)?;
        Ok(self.add_exists(sub, true, Boolean::And))
    }

    fn add_exists(&mut self, query: QueryBuilder, negated: bool, boolean: Boolean) -> &mut Self {
        self.query
            .bindings
            .extend(BindingKind::Where, query.get_bindings());
        self.push_where(
            WhereKind::Exists {
                query: Box::new(query.query),
                negated,
            },
            boolean,
        )
    }

    // ==================== Subquery comparison ====================

    /// `column operator (SELECT ...)`.
    pub fn where_sub(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        query: QueryBuilder,
    ) -> QbResult<&mut Self> {
        self.add_where_sub(column.into(), operator, query, Boolean::And)
    }

    pub fn or_where_sub(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        query: QueryBuilder,
    ) -> QbResult<&mut Self> {
        self.add_where_sub(column.into(), operator, query, Boolean::Or)
    }

    /// [`QueryBuilder::where_sub`] with a builder-configuring callback.
    pub fn where_sub_with<F>(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        f: F,
    ) -> QbResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> QbResult<()>,
    {
        self.check_operator(operator)?;
        let sub = self.build_sub(f)?;
        self.add_where_sub(column.into(), operator, sub, Boolean::And)
    }

    fn add_where_sub(
        &mut self,
        column: ColumnRef,
        operator: &str,
        query: QueryBuilder,
        boolean: Boolean,
    ) -> QbResult<&mut Self> {
        self.check_operator(operator)?;
        self.query
            .bindings
            .extend(BindingKind::Where, query.get_bindings());
        Ok(self.push_where(
            WhereKind::Sub {
                column,
                operator: operator.to_string(),
                query: Box::new(query.query),
            },
            boolean,
        ))
    }

    // ==================== Date parts ====================

    pub fn where_date(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Date, column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where_date(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Date, column.into(), operator, value.into(), Boolean::Or)
    }

    pub fn where_time(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Time, column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where_time(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Time, column.into(), operator, value.into(), Boolean::Or)
    }

    pub fn where_day(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Day, column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where_day(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Day, column.into(), operator, value.into(), Boolean::Or)
    }

    pub fn where_month(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Month, column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where_month(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Month, column.into(), operator, value.into(), Boolean::Or)
    }

    pub fn where_year(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Year, column.into(), operator, value.into(), Boolean::And)
    }

    pub fn or_where_year(
        &mut self,
        column: impl Into<ColumnRef>,
        operator: &str,
        value: impl Into<Param>,
    ) -> QbResult<&mut Self> {
        self.add_date_where(DatePart::Year, column.into(), operator, value.into(), Boolean::Or)
    }

    fn add_date_where(
        &mut self,
        part: DatePart,
        column: ColumnRef,
        operator: &str,
        value: Param,
        boolean: Boolean,
    ) -> QbResult<&mut Self> {
        self.check_operator(operator)?;
        if value.is_null() {
            return Err(QbError::IllegalOperatorAndValue {
                operator: operator.to_string(),
            });
        }
        self.bind(BindingKind::Where, &value);
        Ok(self.push_where(
            WhereKind::Date {
                part,
                column,
                operator: operator.to_string(),
                value,
            },
            boolean,
        ))
    }

    // ==================== Row values ====================

    /// `(a, b) operator (?, ?)`. Column and value counts must match.
    pub fn where_row_values<C, V>(
        &mut self,
        columns: C,
        operator: &str,
        values: V,
    ) -> QbResult<&mut Self>
    where
        C: IntoIterator,
        C::Item: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<Param>,
    {
        self.add_row_values(columns, operator, values, Boolean::And)
    }

    pub fn or_where_row_values<C, V>(
        &mut self,
        columns: C,
        operator: &str,
        values: V,
    ) -> QbResult<&mut Self>
    where
        C: IntoIterator,
        C::Item: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<Param>,
    {
        self.add_row_values(columns, operator, values, Boolean::Or)
    }

    fn add_row_values<C, V>(
        &mut self,
        columns: C,
        operator: &str,
        values: V,
        boolean: Boolean,
    ) -> QbResult<&mut Self>
    where
        C: IntoIterator,
        C::Item: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<Param>,
    {
        let columns: Vec<ColumnRef> = columns.into_iter().map(Into::into).collect();
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        if columns.len() != values.len() {
            return Err(QbError::ColumnCountMismatch {
                columns: columns.len(),
                values: values.len(),
            });
        }
        self.check_operator(operator)?;
        for value in &values {
            self.bind(BindingKind::Where, value);
        }
        Ok(self.push_where(
            WhereKind::RowValues {
                columns,
                operator: operator.to_string(),
                values,
            },
            boolean,
        ))
    }

    // ==================== JSON ====================

    /// JSON document containment. The value is bound JSON-encoded.
    pub fn where_json_contains(
        &mut self,
        column: impl Into<ColumnRef>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.add_json_contains(column.into(), value.into(), false, Boolean::And)
    }

    pub fn or_where_json_contains(
        &mut self,
        column: impl Into<ColumnRef>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.add_json_contains(column.into(), value.into(), false, Boolean::Or)
    }

    pub fn where_json_doesnt_contain(
        &mut self,
        column: impl Into<ColumnRef>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.add_json_contains(column.into(), value.into(), true, Boolean::And)
    }

    pub fn or_where_json_doesnt_contain(
        &mut self,
        column: impl Into<ColumnRef>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.add_json_contains(column.into(), value.into(), true, Boolean::Or)
    }

    fn add_json_contains(
        &mut self,
        column: ColumnRef,
        value: serde_json::Value,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        let value = Param::Value(Value::Text(value.to_string()));
        self.bind(BindingKind::Where, &value);
        self.push_where(
            WhereKind::JsonContains {
                column,
                value,
                negated,
            },
            boolean,
        )
    }
}
