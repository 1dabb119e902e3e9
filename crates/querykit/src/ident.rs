//! SQL identifier segmentation.
//!
//! The grammar never validates identifiers; it splits them and quotes each
//! piece with the dialect's quote character. This module only knows how an
//! identifier string is shaped:
//!
//! - `*` is left alone
//! - `expr as alias` (case-insensitive `as`) is split into target and alias
//! - `column->path->to->key` is a JSON selector
//! - anything else is split on `.` into segments (`schema.table.column`)
//!
//! # Example
//! ```ignore
//! use querykit::ident::{Identifier, parse};
//!
//! assert!(matches!(parse("users.id as uid"), Identifier::Aliased { .. }));
//! ```

use regex::Regex;
use std::sync::LazyLock;

static ALIAS_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+as\s+").expect("alias pattern is a valid regex")
});

/// The shape of an identifier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// A bare `*`.
    Star,
    /// `target as alias`; `target` may itself be dotted or a JSON selector.
    Aliased { target: &'a str, alias: &'a str },
    /// `column->a->b`; `column` may be dotted.
    Json { column: &'a str, path: Vec<&'a str> },
    /// Dotted name, one entry per segment.
    Segments(Vec<&'a str>),
}

/// Classify an identifier string.
pub fn parse(value: &str) -> Identifier<'_> {
    if value == "*" {
        return Identifier::Star;
    }

    if let Some((target, alias)) = split_alias(value) {
        return Identifier::Aliased { target, alias };
    }

    if let Some((column, path)) = split_json(value) {
        return Identifier::Json { column, path };
    }

    Identifier::Segments(value.split('.').collect())
}

/// Split `expr as alias` into its two halves.
pub fn split_alias(value: &str) -> Option<(&str, &str)> {
    let found = ALIAS_SPLIT.find(value)?;
    let target = value[..found.start()].trim();
    let alias = value[found.end()..].trim();
    if target.is_empty() || alias.is_empty() {
        return None;
    }
    Some((target, alias))
}

/// Split `column->a->b` into the column and its JSON path.
pub fn split_json(value: &str) -> Option<(&str, Vec<&str>)> {
    let (column, rest) = value.split_once("->")?;
    let path = rest
        .split("->")
        .map(|attr| attr.trim_start_matches('>'))
        .collect();
    Some((column, path))
}

/// Quote a single identifier segment, doubling any embedded quote character.
///
/// `*` is never quoted.
pub fn quote_segment(segment: &str, quote: char) -> String {
    if segment == "*" {
        return segment.to_string();
    }
    let mut out = String::with_capacity(segment.len() + 2);
    write_quoted(&mut out, segment, quote);
    out
}

pub(crate) fn write_quoted(out: &mut String, segment: &str, quote: char) {
    out.push(quote);
    for ch in segment.chars() {
        if ch == quote {
            out.push(quote);
            out.push(quote);
        } else {
            out.push(ch);
        }
    }
    out.push(quote);
}

/// Quote a string literal with single quotes (for DDL defaults and comments).
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
