//! The `Db` entry point.

use crate::command::Command;
use crate::condition::Check;
use crate::config::DbConfig;
use crate::connection::{ConnectionInfo, DbConnection};
use crate::dialect::{DialectRegistry, QueryService};
use crate::driver::{ConnectionState, Driver, Row};
use crate::error::{DbError, DbResult, Phase};
use crate::events::{ErrorChannel, ErrorEvent};
use crate::mapping::{MappingContainer, Table};
use crate::model::Model;
use crate::query::{Delete, Insert, Select, Statement, Update};
use crate::resolver::ModelResolver;
use crate::value::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Binds a dialect, a mapping registry, a driver and an error channel.
///
/// Statements on one `Db` run one at a time over a single connection.
pub struct Db {
    config: DbConfig,
    dialect: Arc<dyn QueryService>,
    mappings: Arc<MappingContainer>,
    errors: ErrorChannel,
    driver: Option<Arc<dyn Driver>>,
    connection: Mutex<Option<DbConnection>>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("provider", &self.config.provider)
            .field("strategy", &self.config.strategy)
            .field("dialect", &self.dialect.name())
            .field("errors", &self.errors)
            .finish()
    }
}

impl Db {
    /// `Db` for `config` over `driver`, using the dialect registered for the
    /// configured provider.
    pub fn new(config: DbConfig, driver: Arc<dyn Driver>) -> DbResult<Self> {
        Ok(Self::with_config(config)?.with_driver(driver))
    }

    /// `Db` without a driver. It renders statements; executing one fails with
    /// `NotInitialized` until [`Self::with_driver`] is applied.
    pub fn with_config(config: DbConfig) -> DbResult<Self> {
        Self::with_registry(config, DialectRegistry::global())
    }

    /// Like [`Self::with_config`], resolving the dialect from `registry`.
    pub fn with_registry(config: DbConfig, registry: &DialectRegistry) -> DbResult<Self> {
        config.validate()?;
        let dialect = registry.get(&config.provider)?;
        let mappings = Arc::new(MappingContainer::new(config.mapping_behavior));
        Ok(Self {
            config,
            dialect,
            mappings,
            errors: ErrorChannel::new(),
            driver: None,
            connection: Mutex::new(None),
        })
    }

    pub fn with_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self.connection = Mutex::new(None);
        self
    }

    pub fn with_dialect(mut self, dialect: Arc<dyn QueryService>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Share a mapping registry, e.g. [`MappingContainer::global`].
    pub fn with_mappings(mut self, mappings: Arc<MappingContainer>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn QueryService {
        self.dialect.as_ref()
    }

    pub fn mappings(&self) -> &Arc<MappingContainer> {
        &self.mappings
    }

    pub fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Mapping for `M`, applying the default mapping behavior.
    pub fn table<M: Model>(&self) -> DbResult<Arc<Table>> {
        self.mappings.get::<M>()
    }

    // ==================== Builders ====================

    /// SELECT over the mapped columns of `M`.
    pub fn select<M: Model>(&self) -> DbResult<Select> {
        let table = self.table::<M>()?;
        Ok(Select::from_table(&table))
    }

    pub fn select_from(&self, table: &str) -> DbResult<Select> {
        Select::new(table)
    }

    pub fn insert_into(&self, table: &str) -> DbResult<Insert> {
        Insert::new(table)
    }

    pub fn update(&self, table: &str) -> DbResult<Update> {
        Update::new(table)
    }

    pub fn delete_from(&self, table: &str) -> DbResult<Delete> {
        Delete::new(table)
    }

    // ==================== Connection ====================

    /// Open the connection. Needed before statements with `Manual` strategy.
    pub async fn open(&self) -> DbResult<()> {
        let mut guard = self.connection.lock().await;
        let result = match self.acquire(&mut *guard).await {
            Ok(conn) => conn.open().await,
            Err(err) => Err(err),
        };
        self.route(result, (), Phase::Open, None, guard.as_ref())
    }

    pub async fn close(&self) -> DbResult<()> {
        let mut guard = self.connection.lock().await;
        let result = match guard.as_mut() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        };
        self.route(result, (), Phase::Close, None, guard.as_ref())
    }

    /// Current connection state; `Closed` before the first statement.
    pub async fn state(&self) -> ConnectionState {
        self.connection
            .lock()
            .await
            .as_ref()
            .map_or(ConnectionState::Closed, DbConnection::state)
    }

    // ==================== Execution ====================

    /// Run `command` and return the raw rows.
    pub async fn query_rows(&self, command: &Command) -> DbResult<Vec<Row>> {
        let mut guard = self.connection.lock().await;
        let result = match self.acquire(&mut *guard).await {
            Ok(conn) => conn.query(command, Phase::ReadAll).await,
            Err(err) => Err(err),
        };
        self.route(result, Vec::new(), Phase::ReadAll, Some(command), guard.as_ref())
    }

    /// Run `command` and resolve every row into `M`.
    pub async fn read_all<M: Model>(&self, command: &Command) -> DbResult<Vec<M>> {
        let rows = self.query_rows(command).await?;
        let table = self.read_mapping::<M>()?;
        ModelResolver::resolve_all(&rows, table.as_deref())
    }

    /// Run `command` and resolve the first row into `M`.
    pub async fn read_one<M: Model>(&self, command: &Command) -> DbResult<Option<M>> {
        let rows = {
            let mut guard = self.connection.lock().await;
            let result = match self.acquire(&mut *guard).await {
                Ok(conn) => conn.query(command, Phase::ReadOne).await,
                Err(err) => Err(err),
            };
            self.route(result, Vec::new(), Phase::ReadOne, Some(command), guard.as_ref())?
        };
        let table = self.read_mapping::<M>()?;
        rows.first()
            .map(|row| ModelResolver::resolve(row, table.as_deref()))
            .transpose()
    }

    /// Run `command` for its affected-row count.
    pub async fn non_query(&self, command: &Command) -> DbResult<u64> {
        let mut guard = self.connection.lock().await;
        let result = match self.acquire(&mut *guard).await {
            Ok(conn) => conn.execute(command).await,
            Err(err) => Err(err),
        };
        self.route(result, 0, Phase::NonQuery, Some(command), guard.as_ref())
    }

    /// Run `command` for the first column of its first row.
    pub async fn scalar(&self, command: &Command) -> DbResult<Value> {
        let mut guard = self.connection.lock().await;
        let result = match self.acquire(&mut *guard).await {
            Ok(conn) => conn.scalar(command).await,
            Err(err) => Err(err),
        };
        self.route(result, Value::Null, Phase::Scalar, Some(command), guard.as_ref())
    }

    // ==================== Models ====================

    /// Every `M` matching `check`.
    pub async fn find<M: Model>(&self, check: Check) -> DbResult<Vec<M>> {
        self.select::<M>()?.filter(check).fetch_all(self).await
    }

    /// First `M` matching `check`.
    pub async fn find_one<M: Model>(&self, check: Check) -> DbResult<Option<M>> {
        self.select::<M>()?.filter(check).fetch_one(self).await
    }

    pub async fn insert_model<M: Model>(&self, model: &M) -> DbResult<u64> {
        let table = self.table::<M>()?;
        Insert::from_model(&table, model).execute(self).await
    }

    /// Insert `model` and return the value generated for its identity column.
    pub async fn insert_model_returning_id<M: Model>(&self, model: &M) -> DbResult<Value> {
        let table = self.table::<M>()?;
        let identity = table
            .key_columns()
            .find(|c| c.is_database_generated)
            .ok_or_else(|| {
                DbError::invalid_argument(format!(
                    "'{}' has no database-generated primary key",
                    table.name()
                ))
            })?;
        Insert::from_model(&table, model)
            .returning_identity(identity.column_name)
            .execute_scalar(self)
            .await
    }

    /// Update `model`'s row, matched by its primary key columns.
    pub async fn update_model<M: Model>(&self, model: &M) -> DbResult<u64> {
        let table = self.table::<M>()?;
        let filter = key_filter(&table, model)?;
        Update::from_model(&table, model, filter).execute(self).await
    }

    /// Update the rows matching `filter` with `model`'s values.
    pub async fn update_model_where<M: Model>(&self, model: &M, filter: Check) -> DbResult<u64> {
        let table = self.table::<M>()?;
        Update::from_model(&table, model, filter).execute(self).await
    }

    /// Like [`Self::update_model`], failing with `ConcurrencyConflict` when no
    /// row was updated.
    pub async fn update_model_checked<M: Model>(&self, model: &M) -> DbResult<()> {
        match self.update_model(model).await? {
            0 => Err(DbError::ConcurrencyConflict(format!(
                "no {} row matched the key",
                M::descriptor().type_name
            ))),
            _ => Ok(()),
        }
    }

    /// Delete `model`'s row, matched by its primary key columns.
    pub async fn delete_model<M: Model>(&self, model: &M) -> DbResult<u64> {
        let table = self.table::<M>()?;
        let filter = key_filter(&table, model)?;
        Delete::new(table.name())?.filter(filter).execute(self).await
    }

    /// Build `statement` against this `Db`'s dialect.
    pub fn build(&self, statement: &impl Statement) -> DbResult<Command> {
        statement.build(self.dialect())
    }

    // ==================== Internals ====================

    fn read_mapping<M: Model>(&self) -> DbResult<Option<Arc<Table>>> {
        match self.mappings.get::<M>() {
            Ok(table) => Ok(Some(table)),
            Err(DbError::NotMapped(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn acquire<'a>(
        &self,
        slot: &'a mut Option<DbConnection>,
    ) -> DbResult<&'a mut DbConnection> {
        if slot.is_none() {
            let driver = self.driver.as_ref().ok_or_else(|| {
                DbError::NotInitialized(format!(
                    "no driver configured for provider '{}'",
                    self.config.provider
                ))
            })?;
            let inner = driver
                .connect(&self.config.connection_string)
                .await
                .map_err(|e| DbError::execution(Phase::Config, e))?;
            *slot = Some(DbConnection::new(
                self.config.provider.clone(),
                self.config.strategy,
                inner,
            ));
        }
        slot.as_mut().ok_or_else(|| {
            DbError::NotInitialized(format!("no connection for '{}'", self.config.provider))
        })
    }

    /// Publish execution errors to the channel when someone is listening and
    /// substitute `fallback`; return everything else unchanged.
    fn route<T>(
        &self,
        result: DbResult<T>,
        fallback: T,
        phase: Phase,
        command: Option<&Command>,
        connection: Option<&DbConnection>,
    ) -> DbResult<T> {
        let error = match result {
            Ok(value) => return Ok(value),
            Err(error) if error.is_execution() => error,
            Err(error) => return Err(error),
        };
        let event = ErrorEvent {
            phase: error.phase().unwrap_or(phase),
            error,
            connection: connection.map_or_else(|| self.detached_info(), DbConnection::info),
            command: command.cloned(),
        };
        match self.errors.publish(event) {
            Ok(()) => Ok(fallback),
            Err(event) => Err(event.error),
        }
    }

    fn detached_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            provider: self.config.provider.clone(),
            strategy: self.config.strategy,
            state: ConnectionState::Closed,
        }
    }
}

/// `key1 = v1 and key2 = v2 ...` over the table's primary key columns.
fn key_filter<M: Model>(table: &Table, model: &M) -> DbResult<Check> {
    let mut filter: Option<Check> = None;
    for column in table.key_columns() {
        let value = model.get_property(column.property_name()).unwrap_or_default();
        let check = Check::op(column.column_name, value)?;
        filter = Some(match filter {
            Some(existing) => existing.and(check),
            None => check,
        });
    }
    filter.ok_or_else(|| {
        DbError::invalid_argument(format!("'{}' has no primary key column", table.name()))
    })
}
