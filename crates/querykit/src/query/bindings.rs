//! Binding buckets keyed by clause family.
//!
//! Values are recorded in the bucket of the clause they belong to, not in call
//! order. Concatenating the buckets in [`BindingKind::ALL`] order yields the
//! left-to-right order of `?` placeholders in the compiled SQL, because the
//! grammar emits clauses in the same order.

use crate::value::Value;
use std::fmt;

/// Clause family a bound value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Select,
    From,
    Join,
    Where,
    Having,
    Order,
    Union,
}

impl BindingKind {
    /// Flattening order; matches clause emission order.
    pub const ALL: [BindingKind; 7] = [
        BindingKind::Select,
        BindingKind::From,
        BindingKind::Join,
        BindingKind::Where,
        BindingKind::Having,
        BindingKind::Order,
        BindingKind::Union,
    ];

    fn index(self) -> usize {
        match self {
            BindingKind::Select => 0,
            BindingKind::From => 1,
            BindingKind::Join => 2,
            BindingKind::Where => 3,
            BindingKind::Having => 4,
            BindingKind::Order => 5,
            BindingKind::Union => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BindingKind::Select => "select",
            BindingKind::From => "from",
            BindingKind::Join => "join",
            BindingKind::Where => "where",
            BindingKind::Having => "having",
            BindingKind::Order => "order",
            BindingKind::Union => "union",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The seven binding buckets of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    buckets: [Vec<Value>; 7],
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value to a bucket.
    pub fn push(&mut self, kind: BindingKind, value: Value) {
        self.buckets[kind.index()].push(value);
    }

    /// Append several values to a bucket, preserving their order.
    pub fn extend(&mut self, kind: BindingKind, values: impl IntoIterator<Item = Value>) {
        self.buckets[kind.index()].extend(values);
    }

    /// Replace the contents of a bucket.
    pub fn set(&mut self, kind: BindingKind, values: Vec<Value>) {
        self.buckets[kind.index()] = values;
    }

    pub fn clear(&mut self, kind: BindingKind) {
        self.buckets[kind.index()].clear();
    }

    pub fn get(&self, kind: BindingKind) -> &[Value] {
        &self.buckets[kind.index()]
    }

    /// Iterate buckets in flattening order.
    pub fn iter(&self) -> impl Iterator<Item = (BindingKind, &[Value])> {
        BindingKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
    }

    /// Concatenate every bucket in flattening order.
    pub fn flatten(&self) -> Vec<Value> {
        self.flatten_except(&[])
    }

    /// Concatenate every bucket not listed in `skip`.
    pub fn flatten_except(&self, skip: &[BindingKind]) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        for (kind, values) in self.iter() {
            if !skip.contains(&kind) {
                out.extend(values.iter().cloned());
            }
        }
        out
    }

    /// Concatenate only the buckets listed in `keep`, still in flattening order.
    pub fn flatten_only(&self, keep: &[BindingKind]) -> Vec<Value> {
        let mut out = Vec::new();
        for (kind, values) in self.iter() {
            if keep.contains(&kind) {
                out.extend(values.iter().cloned());
            }
        }
        out
    }

    /// Total number of values across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_in_fixed_order() {
        let mut b = Bindings::new();
        b.push(BindingKind::Union, Value::Int(7));
        b.push(BindingKind::Having, Value::from("x"));
        b.push(BindingKind::Select, Value::Int(1));
        b.push(BindingKind::Where, Value::Int(3));
        b.push(BindingKind::Join, Value::from("y"));

        assert_eq!(
            b.flatten(),
            vec![
                Value::Int(1),
                Value::from("y"),
                Value::Int(3),
                Value::from("x"),
                Value::Int(7)
            ]
        );
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn flatten_except_skips_buckets() {
        let mut b = Bindings::new();
        b.push(BindingKind::Select, Value::Int(1));
        b.push(BindingKind::Where, Value::Int(2));
        assert_eq!(b.flatten_except(&[BindingKind::Select]), vec![Value::Int(2)]);
    }

    #[test]
    fn flatten_only_keeps_fixed_order() {
        let mut b = Bindings::new();
        b.push(BindingKind::Order, Value::Int(9));
        b.push(BindingKind::Where, Value::Int(2));
        b.push(BindingKind::Join, Value::Int(1));
        assert_eq!(
            b.flatten_only(&[BindingKind::Where, BindingKind::Join]),
            vec![Value::Int(1), Value::Int(2)]
        );
    }
}
