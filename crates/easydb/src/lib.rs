//! # easydb
//!
//! A provider-agnostic SQL builder and row-to-model mapper.
//!
//! ## Features
//!
//! - **Parameterized by construction**: conditions are built as [`Check`] chains and
//!   every value is bound under a unique `@name`
//! - **Pluggable dialects**: quoting, limiting, pagination and identity return are
//!   rendered by a [`QueryService`] looked up by provider key
//! - **Declarative mapping**: tables are registered explicitly or discovered from a
//!   `#[derive(Model)]` descriptor
//! - **Connection strategy**: open/close around each statement, or leave it to the caller
//! - **Error channel**: subscribe to execution failures instead of handling `Err`
//!
//! ## Example
//!
//! ```ignore
//! use easydb::prelude::*;
//!
//! #[derive(Debug, Default, Model)]
//! #[easydb(table = "posts")]
//! struct Post {
//!     #[easydb(key, generated)]
//!     id: i64,
//!     title: String,
//!     views: i32,
//! }
//!
//! let db = Db::new(DbConfig::new("sqlite", "app.db"), Arc::new(SqliteDriver))?;
//!
//! let popular: Vec<Post> = db
//!     .select::<Post>()?
//!     .filter(Check::gt("views", 100)?.and(Check::like("title", "%rust%")?))
//!     .order_by("views desc")
//!     .limit(10)
//!     .fetch_all(&db)
//!     .await?;
//!
//! db.update("posts")?
//!     .set("views", 0)
//!     .filter(Check::op("id", 1)?)
//!     .execute(&db)
//!     .await?;
//! ```

extern crate self as easydb;

pub mod command;
pub mod condition;
pub mod config;
pub mod connection;
pub mod container;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod events;
pub mod guard;
pub mod mapping;
pub mod model;
pub mod prelude;
pub mod query;
pub mod resolver;
pub mod value;

#[cfg(test)]
mod test_models;

pub use command::{Command, CommandKind, Parameter};
pub use condition::{Check, Condition, Joiner};
pub use config::{ConnectionStrategy, DbConfig};
pub use connection::{ConnectionInfo, DbConnection};
pub use container::{
    ChainedConditionAndParameter, ConditionAndParameter, ConditionAndParameterContainer,
    ResolvedCondition,
};
pub use db::Db;
pub use dialect::{
    DialectRegistry, LimitPlacement, MySqlDialect, PostgresDialect, QueryService,
    SqlServerDialect, SqliteDialect,
};
pub use driver::{Connection, ConnectionState, Driver, Row};
pub use error::{DbError, DbResult, DriverError, Phase};
pub use events::{ErrorChannel, ErrorEvent, ErrorHandler, HandlerId};
pub use guard::NameChecker;
pub use mapping::{
    Column, ColumnKind, ColumnOptions, DefaultMappingBehavior, IntermediateTable, JoinTarget,
    MappingContainer, PropertyColumn, Table,
};
pub use model::{Model, ModelDescriptor, PropertyDescriptor};
pub use query::{Delete, Insert, Select, Statement, Update};
pub use resolver::ModelResolver;
pub use value::{FromValue, ScalarValue, Value, ValueKind};

#[cfg(feature = "derive")]
pub use easydb_derive::Model;

#[cfg(feature = "sqlite")]
pub use drivers::SqliteDriver;

#[cfg(feature = "postgres")]
pub use drivers::PostgresDriver;
