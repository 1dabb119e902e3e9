//! Raw SQL fragments.
//!
//! An [`Expression`] is rendered exactly as given: it is never quoted and never
//! turned into a placeholder. It is the sanctioned escape hatch for SQL the
//! builder cannot express, so the caller is responsible for its safety.
//!
//! # Example
//! ```ignore
//! use querykit::{raw, QueryGrammar, QueryBuilder};
//!
//! let mut q = QueryBuilder::new(QueryGrammar::postgres());
//! q.from("users").select([raw("count(*) as user_count")]);
//! ```

use std::fmt;

/// An unescaped, unparameterized SQL fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    /// Wrap a literal SQL fragment.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fragment as it will appear in the compiled SQL.
    pub fn render(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Shorthand for [`Expression::new`].
pub fn raw(value: impl Into<String>) -> Expression {
    Expression::new(value)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! expression_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expression {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

expression_from_number!(i32, i64, u32, u64, f64);

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self(value)
    }
}
