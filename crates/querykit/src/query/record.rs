//! Column/value records for INSERT and UPDATE.

use crate::error::{QbError, QbResult};
use crate::value::{Param, Value};

/// An ordered list of `column = value` assignments.
///
/// # Example
/// ```ignore
/// let record = Record::new()
///     .set("email", "alice@example.com")
///     .set("votes", 0)
///     .set("updated_at", raw("now()"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Param)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Param>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a JSON column from any serializable value.
    pub fn set_json<T: serde::Serialize>(
        self,
        column: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<Self> {
        let json = serde_json::to_value(value)?;
        Ok(self.set(column, Value::Json(json)))
    }

    /// In-place counterpart of [`Record::set`].
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Param>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.fields.iter().map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.fields.iter().map(|(c, p)| (c.as_str(), p))
    }

    /// Values that produce placeholders, in column order.
    pub fn bindings(&self) -> impl Iterator<Item = Value> + '_ {
        self.params().filter_map(|p| p.as_value().cloned())
    }

    pub(crate) fn sorted(mut self) -> Self {
        self.fields.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Param>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Prepare records for a multi-row insert.
///
/// A single record keeps its column order. Several records are each sorted by
/// column name and must share one column list.
pub(crate) fn normalize_records(records: Vec<Record>) -> QbResult<Vec<Record>> {
    if records.len() <= 1 {
        return Ok(records);
    }

    let records: Vec<Record> = records.into_iter().map(Record::sorted).collect();
    let expected: Vec<&str> = records[0].columns().collect();
    for (index, record) in records.iter().enumerate().skip(1) {
        let found: Vec<&str> = record.columns().collect();
        if found != expected {
            return Err(QbError::MismatchedRecord {
                index,
                expected: expected.join(", "),
                found: found.join(", "),
            });
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::raw;

    #[test]
    fn set_replaces_existing_column() {
        let record = Record::new().set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.bindings().collect::<Vec<_>>(), vec![Value::Int(3), Value::Int(2)]);
    }

    #[test]
    fn raw_values_are_not_bound() {
        let record = Record::new().set("a", 1).set("b", raw("now()"));
        assert_eq!(record.bindings().count(), 1);
    }

    #[test]
    fn normalize_sorts_multi_row_records() {
        let records = normalize_records(vec![
            Record::new().set("b", 1).set("a", 2),
            Record::new().set("a", 3).set("b", 4),
        ])
        .unwrap();
        assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn normalize_rejects_mismatched_columns() {
        let err = normalize_records(vec![
            Record::new().set("a", 1),
            Record::new().set("b", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, QbError::MismatchedRecord { index: 1, .. }));
    }
}
