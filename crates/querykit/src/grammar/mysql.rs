//! MySQL / MariaDB rendering.

use super::json_path;
use crate::query::{DatePart, Lock};

pub(super) const OPERATORS: &[&str] = &["sounds like"];

/// Largest unsigned BIGINT; MySQL cannot express OFFSET without LIMIT.
pub(super) const NO_LIMIT: &str = "18446744073709551615";

pub(super) fn wrap_json_selector(field: &str, path: &[&str]) -> String {
    format!("json_unquote(json_extract({field}, {}))", json_path(path))
}

pub(super) fn compile_lock(lock: &Lock) -> String {
    match lock {
        Lock::Update => "FOR UPDATE".to_string(),
        Lock::Shared => "LOCK IN SHARE MODE".to_string(),
        Lock::Raw(sql) => sql.clone(),
    }
}

pub(super) fn compile_random(seed: Option<u64>) -> String {
    match seed {
        Some(seed) => format!("RAND({seed})"),
        None => "RAND()".to_string(),
    }
}

pub(super) fn wrap_union(sql: &str) -> String {
    format!("({sql})")
}

pub(super) fn date_where(part: DatePart, column: &str, operator: &str, value: &str) -> String {
    let function = match part {
        DatePart::Date => "date",
        DatePart::Time => "time",
        DatePart::Day => "day",
        DatePart::Month => "month",
        DatePart::Year => "year",
    };
    format!("{function}({column}) {operator} {value}")
}

/// `json_contains(field, ?[, path])`; `path` is the already quoted JSON path.
pub(super) fn json_contains(field: &str, path: Option<&str>, value: &str, negated: bool) -> String {
    let not = if negated { "NOT " } else { "" };
    match path {
        Some(path) => format!("{not}json_contains({field}, {value}, {path})"),
        None => format!("{not}json_contains({field}, {value})"),
    }
}

pub(super) fn insert_or_ignore(insert_sql: &str) -> String {
    match insert_sql.strip_prefix("INSERT") {
        Some(rest) => format!("INSERT IGNORE{rest}"),
        None => insert_sql.to_string(),
    }
}

pub(super) fn truncate(table: &str) -> String {
    format!("TRUNCATE TABLE {table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_selector_unquotes() {
        assert_eq!(
            wrap_json_selector("`meta`", &["lang", "primary"]),
            "json_unquote(json_extract(`meta`, '$.\"lang\".\"primary\"'))"
        );
    }

    #[test]
    fn insert_ignore_rewrites_prefix() {
        assert_eq!(
            insert_or_ignore("INSERT INTO `t` (`a`) VALUES (?)"),
            "INSERT IGNORE INTO `t` (`a`) VALUES (?)"
        );
    }
}
