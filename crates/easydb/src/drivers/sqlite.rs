//! SQLite adapter over `rusqlite`.
//!
//! SQLite understands `@name` parameters natively, so command text is passed
//! through unchanged. The connection string is a file path, `:memory:`, or an
//! ADO-style `Data Source=...;` pair.

use crate::command::{Command, CommandKind};
use crate::driver::{Connection, ConnectionState, Driver, Row};
use crate::error::DriverError;
use crate::value::Value;
use async_trait::async_trait;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn provider(&self) -> &str {
        "sqlite"
    }

    async fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DriverError> {
        let path = data_source(connection_string)
            .ok_or_else(|| format!("no data source in '{connection_string}'"))?;
        Ok(Box::new(SqliteConnection::new(path)))
    }
}

pub struct SqliteConnection {
    path: String,
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    fn handle(&self) -> Result<&rusqlite::Connection, DriverError> {
        self.conn
            .as_ref()
            .ok_or_else(|| "sqlite connection is not open".into())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn open(&mut self) -> Result<(), DriverError> {
        if self.conn.is_none() {
            self.conn = Some(rusqlite::Connection::open(&self.path)?);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn create_command(&self, command: &Command) -> Result<(), DriverError> {
        if command.kind() == CommandKind::StoredProcedure {
            return Err("sqlite does not support stored procedures".into());
        }
        Ok(())
    }

    async fn query(&mut self, command: &Command) -> Result<Vec<Row>, DriverError> {
        let conn = self.handle()?;
        let mut stmt = conn.prepare(command.text())?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
        let params = named_params(command);

        let mut rows = stmt.query(params.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_sql(row.get_ref(i)?));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    async fn execute(&mut self, command: &Command) -> Result<u64, DriverError> {
        let conn = self.handle()?;
        let mut stmt = conn.prepare(command.text())?;
        let params = named_params(command);
        let affected = stmt.execute(params.as_slice())?;
        Ok(affected as u64)
    }
}

fn named_params(command: &Command) -> Vec<(&str, &dyn ToSql)> {
    command
        .parameters()
        .iter()
        .map(|p| (p.name.as_str(), &p.value as &dyn ToSql))
        .collect()
}

fn data_source(connection_string: &str) -> Option<String> {
    let trimmed = connection_string.trim();
    if !trimmed.contains('=') {
        return (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| {
            let key = key.trim();
            key.eq_ignore_ascii_case("data source") || key.eq_ignore_ascii_case("filename")
        })
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::I16(n) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*n))),
            Value::I32(n) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*n))),
            Value::I64(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::F32(f) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*f))),
            Value::F64(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => ToSqlOutput::Owned(SqlValue::Text(
                dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            )),
            Value::DateTimeUtc(dt) => ToSqlOutput::Owned(SqlValue::Text(dt.to_rfc3339())),
            Value::Uuid(u) => ToSqlOutput::Owned(SqlValue::Text(u.hyphenated().to_string())),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::I64(n),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_forms() {
        assert_eq!(data_source(":memory:").as_deref(), Some(":memory:"));
        assert_eq!(data_source("app.db").as_deref(), Some("app.db"));
        assert_eq!(
            data_source("Data Source=/tmp/app.db;Cache=Shared").as_deref(),
            Some("/tmp/app.db")
        );
        assert_eq!(data_source("Cache=Shared"), None);
        assert_eq!(data_source("  "), None);
    }

    #[tokio::test]
    async fn round_trip_in_memory() {
        let mut conn = SqliteConnection::new(":memory:");
        assert_eq!(conn.state(), ConnectionState::Closed);
        conn.open().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Open);

        let create = Command::new("create table t (id integer primary key, name text, score real)").unwrap();
        conn.execute(&create).await.unwrap();

        let insert = Command::new("insert into t (name, score) values (@name, @score)")
            .unwrap()
            .bind("@name", "alpha")
            .bind("@score", 1.5);
        assert_eq!(conn.execute(&insert).await.unwrap(), 1);

        let rows = conn
            .query(&Command::new("select id, name, score from t where name = @name").unwrap().bind("@name", "alpha"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("alpha".into())));
        assert_eq!(rows[0].get("score"), Some(&Value::F64(1.5)));

        let count = conn.scalar(&Command::new("select count(*) from t").unwrap()).await.unwrap();
        assert_eq!(count, Value::I64(1));

        conn.close().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn stored_procedures_are_rejected() {
        let conn = SqliteConnection::new(":memory:");
        let cmd = Command::with_kind("sp_do", CommandKind::StoredProcedure).unwrap();
        assert!(conn.create_command(&cmd).is_err());
    }

    #[tokio::test]
    async fn query_before_open_fails() {
        let mut conn = SqliteConnection::new(":memory:");
        assert!(conn.query(&Command::new("select 1").unwrap()).await.is_err());
    }
}
