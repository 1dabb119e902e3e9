//! PostgreSQL rendering.

use crate::query::{DatePart, Lock};

pub(super) const OPERATORS: &[&str] = &[
    "ilike",
    "not ilike",
    "~",
    "~*",
    "!~",
    "!~*",
    "similar to",
    "not similar to",
    "@>",
    "<@",
    "&&",
    "||",
    "#",
    "-",
    "<<",
    ">>",
];

/// Physical row id used to rewrite UPDATE/DELETE with joins.
pub(super) const ROW_ID: &str = "ctid";

/// `"c"->'a'->>'b'`; integer segments index arrays and stay unquoted.
pub(super) fn wrap_json_selector(field: &str, path: &[&str]) -> String {
    let mut wrapped: Vec<String> = path.iter().map(|p| json_attribute(p)).collect();
    let last = wrapped.pop().unwrap_or_default();
    if wrapped.is_empty() {
        format!("{field}->>{last}")
    } else {
        format!("{field}->{}->>{last}", wrapped.join("->"))
    }
}

fn json_attribute(segment: &str) -> String {
    if segment.parse::<i64>().is_ok() {
        segment.to_string()
    } else {
        format!("'{}'", segment.replace('\'', "''"))
    }
}

pub(super) fn compile_lock(lock: &Lock) -> String {
    match lock {
        Lock::Update => "FOR UPDATE".to_string(),
        Lock::Shared => "FOR SHARE".to_string(),
        Lock::Raw(sql) => sql.clone(),
    }
}

pub(super) fn wrap_union(sql: &str) -> String {
    format!("({sql})")
}

pub(super) fn date_where(part: DatePart, column: &str, operator: &str, value: &str) -> String {
    match part {
        DatePart::Date => format!("{column}::date {operator} {value}"),
        DatePart::Time => format!("{column}::time {operator} {value}"),
        DatePart::Day => format!("extract(day from {column}) {operator} {value}"),
        DatePart::Month => format!("extract(month from {column}) {operator} {value}"),
        DatePart::Year => format!("extract(year from {column}) {operator} {value}"),
    }
}

/// `(c)::jsonb @> ?`; `column` is the wrapped selector.
pub(super) fn json_contains(column: &str, value: &str, negated: bool) -> String {
    let column = column.replace("->>", "->");
    let not = if negated { "NOT " } else { "" };
    format!("{not}({column})::jsonb @> {value}")
}

/// LIKE against non-text columns needs an explicit cast.
pub(super) fn basic_column(column: String, operator: &str) -> String {
    if operator.to_ascii_lowercase().contains("like") {
        format!("{column}::text")
    } else {
        column
    }
}

pub(super) fn insert_or_ignore(insert_sql: &str) -> String {
    format!("{insert_sql} ON CONFLICT DO NOTHING")
}

pub(super) fn truncate(table: &str) -> String {
    format!("TRUNCATE {table} RESTART IDENTITY CASCADE")
}
