//! SQL dialects.
//!
//! [`QueryService`] renders every SQL fragment the builders emit. Dialects only
//! supply their quoting characters and limit style; the default methods do the rest
//! and a dialect overrides the handful of fragments that differ (identity return,
//! pagination).

mod mysql;
mod postgres;
mod registry;
mod sql_server;
mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use registry::DialectRegistry;
pub use sql_server::SqlServerDialect;
pub use sqlite::SqliteDialect;

use crate::container::ConditionAndParameterContainer;
use crate::error::{DbError, DbResult};
use std::fmt;

/// Where the row limit goes in a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPlacement {
    /// `select top n ...`
    Top,
    /// `select ... limit n`
    Trailing,
}

/// Renders SQL fragments for one database engine.
pub trait QueryService: Send + Sync + fmt::Debug {
    /// Provider key the dialect is registered under by default.
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quote.
    fn quote_chars(&self) -> (char, char);

    fn limit_placement(&self) -> LimitPlacement;

    fn parameter_sigil(&self) -> char {
        '@'
    }

    /// Wrap an identifier in quotes. Already-wrapped input is returned unchanged;
    /// an embedded closing quote is doubled.
    fn wrap_with_quotes(&self, identifier: &str) -> String {
        let (open, close) = self.quote_chars();
        let identifier = identifier.trim();
        if is_wrapped(identifier, open, close) {
            return identifier.to_string();
        }
        let escaped = identifier.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Row limit fragment, with its leading space.
    fn get_limit(&self, limit: u64) -> String {
        match self.limit_placement() {
            LimitPlacement::Top => format!(" top {limit}"),
            LimitPlacement::Trailing => format!(" limit {limit}"),
        }
    }

    /// Quote each dot-separated segment: `dbo.posts.id` → `[dbo].[posts].[id]`.
    fn format_table_and_column(&self, name: &str) -> String {
        let (open, close) = self.quote_chars();
        split_qualified(name.trim(), open, close)
            .into_iter()
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.wrap_with_quotes(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn get_columns(&self, columns: &[&str]) -> String {
        if columns.is_empty() {
            return " ".to_string();
        }
        let formatted: Vec<String> = columns
            .iter()
            .map(|c| self.format_table_and_column(c))
            .collect();
        format!(" {}", formatted.join(","))
    }

    fn get_select(&self, limit: Option<u64>, columns: &[&str]) -> String {
        let mut sql = String::from("select");
        if let (Some(n), LimitPlacement::Top) = (limit, self.limit_placement()) {
            sql.push_str(&self.get_limit(n));
        }
        if columns.is_empty() {
            sql.push_str(" *");
        } else {
            sql.push_str(&self.get_columns(columns));
        }
        sql
    }

    fn get_from(&self, table: &str) -> String {
        format!(" from {}", self.format_table_and_column(table))
    }

    /// Normalize one order-by entry: `col`, `col asc` or `col desc`.
    fn join_order_by_string_value(&self, value: &str) -> DbResult<String> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(DbError::invalid_sort("empty order-by entry")),
            [column] => Ok(self.format_table_and_column(column)),
            [column, direction] => {
                let direction = direction.to_ascii_lowercase();
                if direction != "asc" && direction != "desc" {
                    return Err(DbError::invalid_sort(format!(
                        "unknown sort direction '{direction}' in '{value}'"
                    )));
                }
                Ok(format!(
                    "{} {direction}",
                    self.format_table_and_column(column)
                ))
            }
            _ => Err(DbError::invalid_sort(format!(
                "expected 'column [asc|desc]', got '{value}'"
            ))),
        }
    }

    fn get_order_by(&self, entries: &[String]) -> DbResult<String> {
        if entries.is_empty() {
            return Ok(String::new());
        }
        let rendered = entries
            .iter()
            .map(|e| self.join_order_by_string_value(e))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(format!(" order by {}", rendered.join(",")))
    }

    fn get_where(&self, container: Option<&ConditionAndParameterContainer>) -> String {
        match container {
            Some(c) => format!(" where {}", c.render()),
            None => String::new(),
        }
    }

    /// Parameter name for a column: `[Posts].[First Name]` → `@first_name`.
    fn get_parameter_name(&self, column: &str) -> String {
        let stripped: String = column
            .chars()
            .filter(|c| !matches!(c, '`' | '[' | ']' | '"'))
            .collect();
        let last = stripped.rsplit('.').next().unwrap_or_default();
        let name: String = last
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        // A placeholder cannot start with a digit.
        let lead = if name.starts_with(|c: char| c.is_ascii_digit()) { "_" } else { "" };
        format!("{}{lead}{name}", self.parameter_sigil())
    }

    fn get_condition_op(&self, column: &str, operator: &str, parameter: &str) -> String {
        format!("{column}{operator}{parameter}")
    }

    fn get_like(&self, column: &str, parameter: &str) -> String {
        format!("{column} like {parameter}")
    }

    fn get_between(&self, column: &str, low: &str, high: &str) -> String {
        format!("{column} between {low} and {high}")
    }

    fn get_is_null(&self, column: &str, negated: bool) -> String {
        if negated {
            format!("{column} is not null")
        } else {
            format!("{column} is null")
        }
    }

    /// Fragment appended to an INSERT to return the generated identity.
    fn get_identity_return(&self, column: &str) -> String {
        format!(" returning {}", self.format_table_and_column(column))
    }

    fn get_insert_into(
        &self,
        table: &str,
        columns: &[&str],
        parameters: &[String],
        identity: Option<&str>,
    ) -> String {
        let table = self.format_table_and_column(table);
        let mut sql = if columns.is_empty() {
            format!("insert into {table} default values")
        } else {
            format!(
                "insert into {table} ({}) values ({})",
                self.get_columns(columns).trim_start(),
                parameters.join(",")
            )
        };
        if let Some(identity) = identity {
            sql.push_str(&self.get_identity_return(identity));
        }
        sql
    }

    /// `update T set [a]=@a,[b]=@b` from `(column, parameter)` pairs.
    fn get_update(&self, table: &str, assignments: &[(&str, &str)]) -> String {
        let set: Vec<String> = assignments
            .iter()
            .map(|(column, parameter)| {
                self.get_condition_op(&self.format_table_and_column(column), "=", parameter)
            })
            .collect();
        format!(
            "update {} set {}",
            self.format_table_and_column(table),
            set.join(",")
        )
    }

    fn get_delete(&self, table: &str) -> String {
        format!("delete from {}", self.format_table_and_column(table))
    }

    /// Page fragment: skip `offset` rows, return `fetch` rows.
    fn get_pagination(&self, offset: u64, fetch: u64) -> String {
        format!(" limit {fetch} offset {offset}")
    }

    /// Whether pagination is only valid after an ORDER BY.
    fn pagination_requires_order_by(&self) -> bool {
        false
    }
}

fn is_wrapped(identifier: &str, open: char, close: char) -> bool {
    if identifier.len() < 2 || !identifier.starts_with(open) || !identifier.ends_with(close) {
        return false;
    }
    let inner = &identifier[open.len_utf8()..identifier.len() - close.len_utf8()];
    let doubled = format!("{close}{close}");
    !inner.replace(&doubled, "").contains(close)
}

/// Split on dots outside quoted segments. A doubled close quote inside a
/// quoted segment is an escape, not the end of the segment.
fn split_qualified(name: &str, open: char, close: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut chars = name.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if quoted {
            if c == close {
                if chars.peek().is_some_and(|&(_, next)| next == close) {
                    chars.next();
                } else {
                    quoted = false;
                }
            }
        } else if c == open {
            quoted = true;
        } else if c == '.' {
            segments.push(&name[start..i]);
            start = i + 1;
        }
    }
    segments.push(&name[start..]);
    segments
}
