//! Argument and identifier checks shared by builders and the mapping registry.
//!
//! Property names bound to columns must match
//! `^@?[A-Za-z_]\w*(\.@?[A-Za-z_]\w*)*$`.

use crate::error::{DbError, DbResult};
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@?[A-Za-z_]\w*(\.@?[A-Za-z_]\w*)*$").expect("identifier pattern is valid")
});

/// Fail with `InvalidArgument` when `value` is empty or whitespace only.
pub fn not_empty<'a>(value: &'a str, what: &str) -> DbResult<&'a str> {
    if value.trim().is_empty() {
        return Err(DbError::invalid_argument(format!("{what} cannot be empty")));
    }
    Ok(value)
}

/// Identifier pattern checks.
pub struct NameChecker;

impl NameChecker {
    /// Returns `true` if `name` is a valid (optionally dotted) identifier.
    pub fn is_valid(name: &str) -> bool {
        IDENTIFIER.is_match(name)
    }

    /// Fail with `InvalidIdentifier` unless `name` matches the identifier pattern.
    pub fn check(name: &str) -> DbResult<&str> {
        if Self::is_valid(name) {
            Ok(name)
        } else {
            Err(DbError::invalid_identifier(format!(
                "'{name}' is not a valid identifier"
            )))
        }
    }
}
