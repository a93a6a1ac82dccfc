//! PostgreSQL adapter over `tokio-postgres`.
//!
//! Named `@name` parameters are rewritten to positional `$n` placeholders in
//! order of first appearance. The connection task is spawned on the current
//! tokio runtime.

use crate::command::{Command, CommandKind};
use crate::driver::{Connection, ConnectionState, Driver, Row};
use crate::error::DriverError;
use crate::value::Value;
use async_trait::async_trait;
use bytes::BytesMut;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::types::{IsNull, ToSql, Type, WrongType, to_sql_checked};
use tokio_postgres::{Client, NoTls};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

impl PostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn provider(&self) -> &str {
        "postgres"
    }

    async fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DriverError> {
        // Parse eagerly so a malformed string fails in the config phase.
        connection_string.parse::<tokio_postgres::Config>()?;
        Ok(Box::new(PostgresConnection::new(connection_string)))
    }
}

pub struct PostgresConnection {
    connection_string: String,
    client: Option<Client>,
    task: Option<JoinHandle<()>>,
}

impl PostgresConnection {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            client: None,
            task: None,
        }
    }

    fn client(&self) -> Result<&Client, DriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| "postgres connection is not open".into())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn open(&mut self) -> Result<(), DriverError> {
        if let Some(client) = &self.client {
            if !client.is_closed() {
                return Ok(());
            }
            tracing::debug!(target: "easydb.sql", "postgres connection broken, reconnecting");
            self.close().await?;
        }
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;
        self.task = Some(tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(target: "easydb.sql", error = %e, "postgres connection task ended");
            }
        }));
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.client = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        match &self.client {
            Some(client) if client.is_closed() => ConnectionState::Broken,
            Some(_) => ConnectionState::Open,
            None => ConnectionState::Closed,
        }
    }

    fn create_command(&self, command: &Command) -> Result<(), DriverError> {
        if command.kind() == CommandKind::StoredProcedure {
            return Err("stored procedures are not supported by the postgres adapter".into());
        }
        rewrite_parameters(command).map(|_| ())
    }

    async fn query(&mut self, command: &Command) -> Result<Vec<Row>, DriverError> {
        let (sql, values) = rewrite_parameters(command)?;
        let params: Vec<&(dyn ToSql + Sync)> = values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect();
        let rows = self.client()?.query(&sql, &params).await?;

        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let columns: Arc<[String]> = first.columns().iter().map(|c| c.name().to_string()).collect();
        rows.iter()
            .map(|row| {
                let values = (0..columns.len())
                    .map(|i| from_sql(row, i))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Row::new(Arc::clone(&columns), values))
            })
            .collect()
    }

    async fn execute(&mut self, command: &Command) -> Result<u64, DriverError> {
        let (sql, values) = rewrite_parameters(command)?;
        let params: Vec<&(dyn ToSql + Sync)> = values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect();
        Ok(self.client()?.execute(&sql, &params).await?)
    }
}

/// Rewrite `@name` placeholders to `$n`, skipping quoted text. Returns the
/// values in positional order.
fn rewrite_parameters(command: &Command) -> Result<(String, Vec<&Value>), DriverError> {
    let text = command.text();
    let mut sql = String::with_capacity(text.len());
    let mut order: Vec<&str> = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            sql.push(c);
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                sql.push(c);
            }
            '@' if chars.peek().is_some_and(|(_, n)| n.is_alphabetic() || *n == '_') => {
                let mut end = i + 1;
                while let Some(&(j, n)) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &text[i..end];
                let position = match order.iter().position(|n| *n == name) {
                    Some(p) => p,
                    None => {
                        order.push(name);
                        order.len() - 1
                    }
                };
                sql.push('$');
                sql.push_str(&(position + 1).to_string());
            }
            _ => sql.push(c),
        }
    }

    let values = order
        .iter()
        .map(|name| {
            command
                .parameter(name)
                .ok_or_else(|| DriverError::from(format!("no value bound for parameter {name}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((sql, values))
}

fn from_sql(row: &tokio_postgres::Row, index: usize) -> Result<Value, DriverError> {
    let ty = row.columns()[index].type_().clone();
    let value = match ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(index)?.map(Value::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(index)?.map(Value::I16),
        Type::INT4 => row.try_get::<_, Option<i32>>(index)?.map(Value::I32),
        Type::INT8 => row.try_get::<_, Option<i64>>(index)?.map(Value::I64),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(index)?.map(Value::F32),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index)?.map(Value::F64),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(index)?.map(Value::Bytes),
        Type::DATE => row.try_get::<_, Option<chrono::NaiveDate>>(index)?.map(Value::Date),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(index)?
            .map(Value::DateTime),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)?
            .map(Value::DateTimeUtc),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(index)?.map(Value::Uuid),
        _ => row.try_get::<_, Option<String>>(index)?.map(Value::Text),
    };
    Ok(value.unwrap_or_default())
}

/// Numbers are encoded at the width of the target column type; everything
/// else goes through the inner type's checked encoding, so a mismatch is a
/// `WrongType` error rather than a malformed payload.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, DriverError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::I16(n) => integer_to_sql(i64::from(*n), ty, out),
            Value::I32(n) => integer_to_sql(i64::from(*n), ty, out),
            Value::I64(n) => integer_to_sql(*n, ty, out),
            Value::F32(f) => float_to_sql(f64::from(*f), ty, out),
            Value::F64(f) => float_to_sql(*f, ty, out),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Text(s) => s.to_sql_checked(ty, out),
            Value::Bytes(b) => b.to_sql_checked(ty, out),
            Value::Date(d) => d.to_sql_checked(ty, out),
            Value::DateTime(dt) => dt.to_sql_checked(ty, out),
            Value::DateTimeUtc(dt) => dt.to_sql_checked(ty, out),
            Value::Uuid(u) => u.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn integer_to_sql(n: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, DriverError> {
    match *ty {
        Type::INT2 => i16::try_from(n)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(n)?.to_sql(ty, out),
        Type::INT8 => n.to_sql(ty, out),
        Type::FLOAT4 => (n as f32).to_sql(ty, out),
        Type::FLOAT8 => (n as f64).to_sql(ty, out),
        _ => Err(Box::new(WrongType::new::<i64>(ty.clone()))),
    }
}

fn float_to_sql(f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, DriverError> {
    match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        _ => Err(Box::new(WrongType::new::<f64>(ty.clone()))),
    }
}
