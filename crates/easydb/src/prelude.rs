//! Convenient imports for typical `easydb` usage.
//!
//! ```ignore
//! use easydb::prelude::*;
//! ```

pub use crate::{
    Check, Command, ConnectionStrategy, Db, DbConfig, DbError, DbResult, DefaultMappingBehavior,
    ErrorEvent, Model, Phase, Statement, Table, Value,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteDriver;

#[cfg(feature = "postgres")]
pub use crate::PostgresDriver;

pub use std::sync::Arc;
