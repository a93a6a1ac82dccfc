//! Connection wrapper applying the [`ConnectionStrategy`].

use crate::command::Command;
use crate::config::ConnectionStrategy;
use crate::driver::{Connection, ConnectionState, Row};
use crate::error::{DbError, DbResult, Phase};
use crate::value::Value;

/// Connection details attached to every [`crate::ErrorEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub provider: String,
    pub strategy: ConnectionStrategy,
    pub state: ConnectionState,
}

/// A driver connection plus the open/close policy around each statement.
///
/// `Automatic` opens before and closes after each statement; the close also
/// runs when the statement failed. `Manual` leaves both to the caller.
pub struct DbConnection {
    provider: String,
    strategy: ConnectionStrategy,
    inner: Box<dyn Connection>,
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("provider", &self.provider)
            .field("strategy", &self.strategy)
            .field("state", &self.inner.state())
            .finish()
    }
}

impl DbConnection {
    pub fn new(provider: impl Into<String>, strategy: ConnectionStrategy, inner: Box<dyn Connection>) -> Self {
        Self {
            provider: provider.into(),
            strategy,
            inner,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn strategy(&self) -> ConnectionStrategy {
        self.strategy
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            provider: self.provider.clone(),
            strategy: self.strategy,
            state: self.inner.state(),
        }
    }

    /// Open the connection unless it is already open.
    pub async fn open(&mut self) -> DbResult<()> {
        if self.inner.state() == ConnectionState::Open {
            return Ok(());
        }
        self.inner
            .open()
            .await
            .map_err(|e| DbError::execution(Phase::Open, e))
    }

    /// Close the connection unless it is already closed.
    pub async fn close(&mut self) -> DbResult<()> {
        if self.inner.state() == ConnectionState::Closed {
            return Ok(());
        }
        self.inner
            .close()
            .await
            .map_err(|e| DbError::execution(Phase::Close, e))
    }

    pub async fn query(&mut self, command: &Command, phase: Phase) -> DbResult<Vec<Row>> {
        self.prepare(command, phase).await?;
        let result = self
            .inner
            .query(command)
            .await
            .map_err(|e| DbError::execution(phase, e));
        self.finish(result).await
    }

    pub async fn execute(&mut self, command: &Command) -> DbResult<u64> {
        self.prepare(command, Phase::NonQuery).await?;
        let result = self
            .inner
            .execute(command)
            .await
            .map_err(|e| DbError::execution(Phase::NonQuery, e));
        self.finish(result).await
    }

    pub async fn scalar(&mut self, command: &Command) -> DbResult<Value> {
        self.prepare(command, Phase::Scalar).await?;
        let result = self
            .inner
            .scalar(command)
            .await
            .map_err(|e| DbError::execution(Phase::Scalar, e));
        self.finish(result).await
    }

    async fn prepare(&mut self, command: &Command, phase: Phase) -> DbResult<()> {
        tracing::debug!(
            target: "easydb.sql",
            %phase,
            provider = %self.provider,
            param_count = command.parameters().len(),
            sql = %command.text(),
        );
        if self.strategy == ConnectionStrategy::Automatic {
            self.open().await?;
        }
        if let Err(e) = self.inner.create_command(command) {
            let result = Err(DbError::execution(Phase::CreateCommand, e));
            return self.finish(result).await;
        }
        Ok(())
    }

    async fn finish<T>(&mut self, result: DbResult<T>) -> DbResult<T> {
        if self.strategy == ConnectionStrategy::Manual {
            return result;
        }
        match (self.close().await, result) {
            (Ok(()), result) => result,
            (Err(close), Ok(_)) => Err(close),
            (Err(close), Err(err)) => {
                tracing::warn!(
                    target: "easydb.sql",
                    error = %close,
                    "close after failed statement also failed"
                );
                Err(err)
            }
        }
    }
}
