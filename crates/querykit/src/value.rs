//! Bound values and value-or-raw operands.
//!
//! [`Value`] is what ends up in the flattened binding list handed to a driver.
//! [`Param`] is what builder methods accept: either a value to bind, or a raw
//! [`Expression`] that is rendered in place and never bound.

use crate::expression::Expression;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// A value bound to a `?` placeholder.
///
/// Booleans are bound as `0`/`1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "'{v}'"),
            Value::DateTime(v) => write!(f, "'{v}'"),
            Value::Uuid(v) => write!(f, "'{v}'"),
        }
    }
}

/// A builder operand: a value to bind, or a raw fragment rendered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    Raw(Expression),
}

impl Param {
    /// The bound value, if this operand produces a placeholder.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Param::Value(v) => Some(v),
            Param::Raw(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Param::Value(Value::Null))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Param::Raw(_))
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Value(value)
    }
}

impl From<Expression> for Param {
    fn from(expr: Expression) -> Self {
        Param::Raw(expr)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        Param::Value(value.into())
    }
}

/// Implement `From<$t>` for both [`Value`] and [`Param`].
macro_rules! impl_value_from {
    ($($t:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $body
                }
            }

            impl From<$t> for Param {
                fn from(value: $t) -> Self {
                    Param::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_value_from! {
    i8 => |v| Value::Int(i64::from(v)),
    i16 => |v| Value::Int(i64::from(v)),
    i32 => |v| Value::Int(i64::from(v)),
    i64 => |v| Value::Int(v),
    u8 => |v| Value::Int(i64::from(v)),
    u16 => |v| Value::Int(i64::from(v)),
    u32 => |v| Value::Int(i64::from(v)),
    f32 => |v| Value::Float(f64::from(v)),
    f64 => |v| Value::Float(v),
    bool => |v| Value::Int(i64::from(v)),
    &str => |v| Value::Text(v.to_string()),
    String => |v| Value::Text(v),
    &String => |v| Value::Text(v.clone()),
    Vec<u8> => |v| Value::Bytes(v),
    serde_json::Value => |v| Value::Json(v),
    NaiveDate => |v| Value::Date(v),
    NaiveDateTime => |v| Value::DateTime(v),
    Uuid => |v| Value::Uuid(v),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::raw;

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(Value::from(true), Value::Int(1));
        assert_eq!(Value::from(false), Value::Int(0));
    }

    #[test]
    fn options_map_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Param::from(Some("a")), Param::Value(Value::Text("a".into())));
    }

    #[test]
    fn raw_params_have_no_value() {
        let p = Param::from(raw("now()"));
        assert!(p.as_value().is_none());
        assert!(p.is_raw());
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Int(1), Value::Null, Value::from("x")])
            .unwrap();
        assert_eq!(json, r#"[1,null,"x"]"#);
    }
}
