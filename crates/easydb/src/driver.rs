//! Database driver abstraction.
//!
//! The core never talks to a database directly. A [`Driver`] produces
//! [`Connection`]s from a connection string; the connection opens, closes and
//! executes rendered [`Command`]s. Adapters live in [`crate::drivers`].

use crate::command::Command;
use crate::error::{DbError, DbResult, DriverError};
use crate::value::{FromValue, Value};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Lifecycle state reported by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
    /// The connection failed and must be reopened.
    Broken,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Open => "open",
            ConnectionState::Broken => "broken",
        })
    }
}

/// One result row: column names plus values, by ordinal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// `columns` and `values` are matched by position; the shorter one wins.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(column, value)` pairs in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Value by column name (case-insensitive).
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed value by column name.
    pub fn try_get<T: FromValue>(&self, column: &str) -> DbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| DbError::invalid_argument(format!("no column '{column}' in row")))?;
        T::from_value(value.clone())
    }

    /// First value of the row, or `Null`.
    pub fn into_first(self) -> Value {
        self.values.into_iter().next().unwrap_or_default()
    }
}

/// An open-able connection to one database.
#[async_trait]
pub trait Connection: Send {
    async fn open(&mut self) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;

    fn state(&self) -> ConnectionState;

    /// Check that `command` can run on this connection before execution.
    fn create_command(&self, command: &Command) -> Result<(), DriverError>;

    /// Run a statement that returns rows.
    async fn query(&mut self, command: &Command) -> Result<Vec<Row>, DriverError>;

    /// Run a statement and return the affected row count.
    async fn execute(&mut self, command: &Command) -> Result<u64, DriverError>;

    /// Run a statement and return the first column of the first row.
    async fn scalar(&mut self, command: &Command) -> Result<Value, DriverError> {
        let rows = self.query(command).await?;
        Ok(rows.into_iter().next().map(Row::into_first).unwrap_or_default())
    }
}

/// Factory for connections of one provider.
#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Provider key, matching a registered dialect.
    fn provider(&self) -> &str;

    /// Create an unopened connection.
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lookup_is_case_insensitive() {
        let row = Row::from_pairs([("Id", Value::I64(1)), ("Title", Value::from("a"))]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("title"), Some(&Value::Text("a".into())));
        assert_eq!(row.try_get::<i64>("ID").unwrap(), 1);
        assert!(row.try_get::<i64>("missing").is_err());
        assert_eq!(row.into_first(), Value::I64(1));
    }

    #[test]
    fn empty_row_first_is_null() {
        assert_eq!(Row::default().into_first(), Value::Null);
        assert!(Row::default().is_empty());
    }
}
