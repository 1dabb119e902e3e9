//! SQLite rendering.

use super::json_path;
use crate::query::DatePart;

pub(super) const OPERATORS: &[&str] = &["ilike", "&", "|", "<<", ">>"];

/// Implicit row id used to rewrite UPDATE/DELETE with joins.
pub(super) const ROW_ID: &str = "rowid";

/// SQLite needs a LIMIT before OFFSET; `-1` means unbounded.
pub(super) const NO_LIMIT: &str = "-1";

pub(super) fn wrap_json_selector(field: &str, path: &[&str]) -> String {
    format!("json_extract({field}, {})", json_path(path))
}

/// Compound members cannot carry ORDER BY/LIMIT, so each is wrapped in a derived table.
pub(super) fn wrap_union(sql: &str) -> String {
    format!("SELECT * FROM ({sql})")
}

pub(super) fn date_where(part: DatePart, column: &str, operator: &str, value: &str) -> String {
    let format = match part {
        DatePart::Date => "%Y-%m-%d",
        DatePart::Time => "%H:%M:%S",
        DatePart::Day => "%d",
        DatePart::Month => "%m",
        DatePart::Year => "%Y",
    };
    format!("strftime('{format}', {column}) {operator} cast({value} as text)")
}

pub(super) fn insert_or_ignore(insert_sql: &str) -> String {
    match insert_sql.strip_prefix("INSERT") {
        Some(rest) => format!("INSERT OR IGNORE{rest}"),
        None => insert_sql.to_string(),
    }
}

pub(super) fn reset_sequence() -> &'static str {
    "DELETE FROM sqlite_sequence WHERE name = ?"
}

pub(super) fn truncate(table: &str) -> String {
    format!("DELETE FROM {table}")
}
