//! Statement AST for SELECT/INSERT/UPDATE/DELETE.
//!
//! [`QueryObj`] is plain data: every clause of one statement plus its
//! [`Bindings`]. It is owned by exactly one builder; nested groups, joins,
//! subqueries and union members own their own `QueryObj` boxed inside the
//! parent node. `Clone` is a genuine deep copy.

use super::bindings::Bindings;
use crate::error::QbError;
use crate::expression::Expression;
use crate::value::{Param, Value};
use std::str::FromStr;

/// A column in SELECT, GROUP BY, ORDER BY or a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Name(String),
    Raw(Expression),
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Name(value.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        ColumnRef::Name(value)
    }
}

impl From<&String> for ColumnRef {
    fn from(value: &String) -> Self {
        ColumnRef::Name(value.clone())
    }
}

impl From<Expression> for ColumnRef {
    fn from(value: Expression) -> Self {
        ColumnRef::Raw(value)
    }
}

/// The source of a FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Name(String),
    Raw(Expression),
}

impl TableRef {
    /// The plain table name, if this is not a raw fragment.
    pub fn name(&self) -> Option<&str> {
        match self {
            TableRef::Name(name) => Some(name),
            TableRef::Raw(_) => None,
        }
    }
}

impl From<&str> for TableRef {
    fn from(value: &str) -> Self {
        TableRef::Name(value.to_string())
    }
}

impl From<String> for TableRef {
    fn from(value: String) -> Self {
        TableRef::Name(value)
    }
}

impl From<Expression> for TableRef {
    fn from(value: Expression) -> Self {
        TableRef::Raw(value)
    }
}

/// Boolean connective joining a condition to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_sql(self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// Part of a temporal column compared by the date/time wheres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Time,
    Day,
    Month,
    Year,
}

/// One condition in a WHERE, ON or HAVING tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereNode {
    pub boolean: Boolean,
    pub kind: WhereKind,
}

impl WhereNode {
    pub fn new(kind: WhereKind, boolean: Boolean) -> Self {
        Self { boolean, kind }
    }
}

/// The shape of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereKind {
    /// `column op ?`
    Basic {
        column: ColumnRef,
        operator: String,
        value: Param,
    },
    /// Raw SQL fragment.
    Raw { sql: String },
    /// `column [NOT] IN (?, ...)`
    In {
        column: ColumnRef,
        values: Vec<Param>,
        negated: bool,
    },
    /// `column [NOT] IN (SELECT ...)`
    InSub {
        column: ColumnRef,
        query: Box<QueryObj>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: ColumnRef, negated: bool },
    /// `column [NOT] BETWEEN ? AND ?`
    Between {
        column: ColumnRef,
        low: Param,
        high: Param,
        negated: bool,
    },
    /// Parenthesized group holding the sub-AST's where tree.
    Nested { query: Box<QueryObj> },
    /// `[NOT] EXISTS (SELECT ...)`
    Exists { query: Box<QueryObj>, negated: bool },
    /// `first op second`, both identifiers.
    Column {
        first: ColumnRef,
        operator: String,
        second: ColumnRef,
    },
    /// `column op (SELECT ...)`
    Sub {
        column: ColumnRef,
        operator: String,
        query: Box<QueryObj>,
    },
    /// Comparison on a date/time part of a column.
    Date {
        part: DatePart,
        column: ColumnRef,
        operator: String,
        value: Param,
    },
    /// `(a, b) op (?, ?)`
    RowValues {
        columns: Vec<ColumnRef>,
        operator: String,
        values: Vec<Param>,
    },
    /// JSON document containment.
    JsonContains {
        column: ColumnRef,
        value: Param,
        negated: bool,
    },
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Cross => "CROSS",
        }
    }
}

/// A join: its table plus an ON tree stored as the where tree of `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinType,
    pub table: TableRef,
    pub query: QueryObj,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(QbError::InvalidDirection(s.to_string())),
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderNode {
    Column {
        column: ColumnRef,
        direction: Direction,
    },
    /// Raw fragment. `bindings` is only populated for orders that follow a
    /// union block; other raw orders bind through the order bucket.
    Raw { sql: String, bindings: Vec<Value> },
}

/// A union member.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionPart {
    pub query: Box<QueryObj>,
    pub all: bool,
}

/// Aggregate function applied instead of the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<ColumnRef>,
}

/// Row locking mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    Update,
    Shared,
    Raw(String),
}

/// Renderable parts of a SELECT, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Aggregate,
    Columns,
    From,
    Joins,
    Wheres,
    Groups,
    Havings,
    Orders,
    Limit,
    Offset,
    Unions,
    Lock,
}

impl Component {
    pub const SELECT: [Component; 12] = [
        Component::Aggregate,
        Component::Columns,
        Component::From,
        Component::Joins,
        Component::Wheres,
        Component::Groups,
        Component::Havings,
        Component::Orders,
        Component::Limit,
        Component::Offset,
        Component::Unions,
        Component::Lock,
    ];
}

/// The mutable tree of clause nodes for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryObj {
    pub distinct: bool,
    pub columns: Vec<ColumnRef>,
    pub from: Option<TableRef>,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<WhereNode>,
    pub groups: Vec<ColumnRef>,
    pub havings: Vec<WhereNode>,
    pub orders: Vec<OrderNode>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub unions: Vec<UnionPart>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub union_orders: Vec<OrderNode>,
    pub aggregate: Option<Aggregate>,
    pub lock: Option<Lock>,
    pub bindings: Bindings,
}

impl QueryObj {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `component` holds anything to render.
    pub fn has(&self, component: Component) -> bool {
        match component {
            Component::Aggregate => self.aggregate.is_some(),
            // The column list is always rendered unless an aggregate replaces it.
            Component::Columns => self.aggregate.is_none(),
            Component::From => self.from.is_some(),
            Component::Joins => !self.joins.is_empty(),
            Component::Wheres => !self.wheres.is_empty(),
            Component::Groups => !self.groups.is_empty(),
            Component::Havings => !self.havings.is_empty(),
            Component::Orders => !self.orders.is_empty(),
            Component::Limit => self.limit.is_some(),
            Component::Offset => self.offset.is_some(),
            Component::Unions => !self.unions.is_empty(),
            Component::Lock => self.lock.is_some(),
        }
    }

    /// Reset a component to its empty state.
    pub fn clear(&mut self, component: Component) {
        match component {
            Component::Aggregate => self.aggregate = None,
            // DISTINCT survives so that `count(DISTINCT col)` still renders.
            Component::Columns => self.columns.clear(),
            Component::From => self.from = None,
            Component::Joins => self.joins.clear(),
            Component::Wheres => self.wheres.clear(),
            Component::Groups => self.groups.clear(),
            Component::Havings => self.havings.clear(),
            Component::Orders => self.orders.clear(),
            Component::Limit => self.limit = None,
            Component::Offset => self.offset = None,
            Component::Unions => {
                self.unions.clear();
                self.union_limit = None;
                self.union_offset = None;
                self.union_orders.clear();
            }
            Component::Lock => self.lock = None,
        }
    }

    /// The flattened binding list, in placeholder order.
    pub fn flat_bindings(&self) -> Vec<Value> {
        let mut out = self.bindings.flatten();
        out.extend(self.union_order_bindings());
        out
    }

    pub(crate) fn union_order_bindings(&self) -> impl Iterator<Item = Value> + '_ {
        self.union_orders.iter().flat_map(|order| match order {
            OrderNode::Raw { bindings, .. } => bindings.clone(),
            OrderNode::Column { .. } => Vec::new(),
        })
    }
}
