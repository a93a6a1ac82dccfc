//! Model descriptors.
//!
//! A [`Model`] exposes a static [`ModelDescriptor`] listing its mappable
//! properties in declaration order, plus by-name property access. The
//! `#[derive(Model)]` macro generates all three; hand-written impls work the
//! same way.
//!
//! Only scalar properties (see [`crate::value::ScalarValue`]) appear in the
//! descriptor. Nested models and collections are left to the caller's own
//! relation loading.
//!
//! # Example
//! ```ignore
//! use easydb::Model;
//!
//! #[derive(Debug, Default, Model)]
//! #[easydb(table = "posts")]
//! struct Post {
//!     #[easydb(key, generated)]
//!     id: i64,
//!     title: String,
//!     #[easydb(column = "body")]
//!     content: Option<String>,
//!     #[easydb(ignore)]
//!     preview: String,
//! }
//! ```

use crate::error::DbResult;
use crate::value::{Value, ValueKind};

/// Static description of one model property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property (field) name.
    pub name: &'static str,
    /// Kind the column value is converted to.
    pub kind: ValueKind,
    /// Whether the property accepts `NULL`.
    pub nullable: bool,
    /// Explicit column name override.
    pub column: Option<&'static str>,
    /// Primary key marker.
    pub is_key: bool,
    /// Value is produced by the database (identity, default).
    pub is_database_generated: bool,
    /// Property is never written.
    pub is_ignored: bool,
}

impl PropertyDescriptor {
    pub const fn new(name: &'static str, kind: ValueKind, nullable: bool) -> Self {
        Self {
            name,
            kind,
            nullable,
            column: None,
            is_key: false,
            is_database_generated: false,
            is_ignored: false,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub const fn generated(mut self) -> Self {
        self.is_database_generated = true;
        self
    }

    pub const fn ignored(mut self) -> Self {
        self.is_ignored = true;
        self
    }

    /// Column name: the override when present, else the property name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// Static description of a model type.
#[derive(Debug)]
pub struct ModelDescriptor {
    /// Rust type name, used in diagnostics.
    pub type_name: &'static str,
    /// Default table name.
    pub table_name: &'static str,
    /// Mappable properties in declaration order.
    pub properties: &'static [PropertyDescriptor],
}

impl ModelDescriptor {
    /// Find a property by its exact name.
    pub fn property(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties carrying the key marker.
    pub fn key_properties(&self) -> impl Iterator<Item = &'static PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_key)
    }
}

/// A type whose scalar properties can be read and written by name.
pub trait Model: Default + Send + Sync + 'static {
    /// The static descriptor for this type.
    fn descriptor() -> &'static ModelDescriptor;

    /// Read a property as a [`Value`]. Returns `None` for unknown names.
    fn get_property(&self, name: &str) -> Option<Value>;

    /// Assign a property from a [`Value`] already converted to the property's kind.
    ///
    /// Returns `Ok(false)` for unknown names.
    fn set_property(&mut self, name: &str, value: Value) -> DbResult<bool>;
}
