//! Mapping registry: how model properties correspond to table columns.
//!
//! - [`Table`]: one table's ordered column map, registered explicitly or
//!   discovered from a [`crate::Model`] descriptor
//! - [`Column`]: one column with its property and flags
//! - [`IntermediateTable`]: many-to-many join table
//! - [`MappingContainer`]: registry keyed by model type

pub mod column;
pub mod container;
pub mod intermediate;
pub mod table;

pub use column::{Column, ColumnKind, ColumnOptions};
pub use container::{DefaultMappingBehavior, MappingContainer};
pub use intermediate::{IntermediateTable, JoinTarget};
pub use table::{PropertyColumn, Table};

#[cfg(test)]
mod tests;
