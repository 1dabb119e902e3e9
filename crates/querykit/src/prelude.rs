//! Convenient imports for typical `querykit` usage.
//!
//! ```ignore
//! use querykit::prelude::*;
//! ```

pub use crate::{
    BindingKind, Blueprint, Connection, Dialect, Direction, Expression, FromRow, FromValue,
    Lock, QbError, QbResult, QueryBuilder, QueryGrammar, Record, Row, SchemaBuilder,
    SchemaGrammar, Value, raw,
};
