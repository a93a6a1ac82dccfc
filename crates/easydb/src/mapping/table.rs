use super::column::{Column, ColumnKind, ColumnOptions};
use crate::error::{DbError, DbResult};
use crate::guard::{self, NameChecker};
use crate::model::{Model, ModelDescriptor, PropertyDescriptor};
use indexmap::IndexMap;
use std::any::TypeId;

/// Table mapping for one model type.
///
/// Columns keep their registration order. SELECT lists and write column
/// lists follow the model's property order (see [`Table::property_columns`]).
///
/// # Example
///
/// ```ignore
/// use easydb::mapping::{ColumnOptions, Table};
///
/// let table = Table::new::<Post>("posts")?
///     .set_primary_key_column("id", "id", ColumnOptions::generated())?
///     .set_column("title", "title")?
///     .set_column("body", "content")?;
/// # Ok::<(), easydb::DbError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    model_type: TypeId,
    descriptor: &'static ModelDescriptor,
    columns: IndexMap<String, Column>,
}

impl Table {
    /// Create an empty mapping for `M` on table `name`.
    pub fn new<M: Model>(name: &str) -> DbResult<Self> {
        let name = guard::not_empty(name, "Table name")?;
        NameChecker::check(name)?;
        Ok(Self {
            name: name.to_string(),
            model_type: TypeId::of::<M>(),
            descriptor: M::descriptor(),
            columns: IndexMap::new(),
        })
    }

    /// Discover the mapping from `M`'s descriptor, on its default table name.
    pub fn discover<M: Model>() -> DbResult<Self> {
        Self::discover_as::<M>(M::descriptor().table_name)
    }

    /// Discover the mapping from `M`'s descriptor, on table `name`.
    ///
    /// Every descriptor property becomes a column in declaration order: key
    /// properties become primary key columns, column overrides and the
    /// generated / ignored markers are honored.
    pub fn discover_as<M: Model>(name: &str) -> DbResult<Self> {
        let mut table = Self::new::<M>(name)?;
        for property in table.descriptor.properties {
            let kind = if property.is_key {
                ColumnKind::PrimaryKey
            } else {
                ColumnKind::Regular
            };
            let options = ColumnOptions {
                database_generated: property.is_database_generated,
                ignored: property.is_ignored,
            };
            table.add(property.column_name(), property, kind, options)?;
        }
        tracing::debug!(
            target: "easydb.mapping",
            model = table.descriptor.type_name,
            table = %table.name,
            columns = table.columns.len(),
            "discovered table mapping"
        );
        Ok(table)
    }

    /// Mapping holding only the key-marked properties of `M`.
    pub fn minimal<M: Model>() -> DbResult<Self> {
        let mut table = Self::new::<M>(M::descriptor().table_name)?;
        for property in table.descriptor.key_properties() {
            let options = ColumnOptions {
                database_generated: property.is_database_generated,
                ignored: false,
            };
            table.add(property.column_name(), property, ColumnKind::PrimaryKey, options)?;
        }
        Ok(table)
    }

    fn resolve_property(&self, property: &str) -> DbResult<&'static PropertyDescriptor> {
        NameChecker::check(property)?;
        self.descriptor.property(property).ok_or_else(|| {
            DbError::invalid_argument(format!(
                "{} has no mappable property '{property}'",
                self.descriptor.type_name
            ))
        })
    }

    fn add(
        &mut self,
        column_name: &str,
        property: &'static PropertyDescriptor,
        kind: ColumnKind,
        options: ColumnOptions,
    ) -> DbResult<()> {
        let column_name = guard::not_empty(column_name, "Column name")?;
        if self.columns.contains_key(column_name) {
            return Err(DbError::DuplicateColumn {
                table: self.name.clone(),
                column: column_name.to_string(),
            });
        }
        self.columns.insert(
            column_name.to_string(),
            Column {
                table_name: self.name.clone(),
                model_type: self.descriptor.type_name,
                column_name: column_name.to_string(),
                property,
                is_database_generated: options.database_generated,
                is_ignored: options.ignored,
                kind,
            },
        );
        Ok(())
    }

    fn register(
        mut self,
        column_name: &str,
        property: &str,
        kind: ColumnKind,
        options: ColumnOptions,
    ) -> DbResult<Self> {
        let property = self.resolve_property(property)?;
        self.add(column_name, property, kind, options)?;
        Ok(self)
    }

    /// Map `column_name` to `property`.
    pub fn set_column(self, column_name: &str, property: &str) -> DbResult<Self> {
        self.register(column_name, property, ColumnKind::Regular, ColumnOptions::default())
    }

    /// Map `column_name` to `property` with explicit flags.
    pub fn set_column_with(
        self,
        column_name: &str,
        property: &str,
        options: ColumnOptions,
    ) -> DbResult<Self> {
        self.register(column_name, property, ColumnKind::Regular, options)
    }

    /// Map a primary key column.
    pub fn set_primary_key_column(
        self,
        column_name: &str,
        property: &str,
        options: ColumnOptions,
    ) -> DbResult<Self> {
        self.register(column_name, property, ColumnKind::PrimaryKey, options)
    }

    /// Map a foreign key column referencing `table_referenced.primary_key_referenced`.
    pub fn set_foreign_key_column(
        self,
        column_name: &str,
        property: &str,
        table_referenced: &str,
        primary_key_referenced: &str,
    ) -> DbResult<Self> {
        let table_referenced = guard::not_empty(table_referenced, "Referenced table")?;
        let primary_key_referenced =
            guard::not_empty(primary_key_referenced, "Referenced primary key")?;
        let kind = ColumnKind::ForeignKey {
            table_referenced: table_referenced.to_string(),
            primary_key_referenced: primary_key_referenced.to_string(),
        };
        self.register(column_name, property, kind, ColumnOptions::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> TypeId {
        self.model_type
    }

    pub fn descriptor(&self) -> &'static ModelDescriptor {
        self.descriptor
    }

    /// Columns in registration order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by column name.
    pub fn column(&self, column_name: &str) -> Option<&Column> {
        self.columns.get(column_name)
    }

    /// Look up a column by the name of the property it maps.
    pub fn column_by_property_name(&self, property: &str) -> Option<&Column> {
        self.columns.values().find(|c| c.property.name == property)
    }

    pub fn contains_property(&self, property: &str) -> bool {
        self.column_by_property_name(property).is_some()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().filter(|c| c.is_primary_key())
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().filter(|c| c.is_foreign_key())
    }

    /// Every descriptor property resolved against this mapping, in declaration
    /// order.
    ///
    /// A property with registered columns yields those columns and their flags.
    /// An unregistered property falls back to its own column name and
    /// descriptor markers, unless that name is already taken by a registered
    /// column.
    pub fn property_columns(&self) -> Vec<PropertyColumn<'_>> {
        let mut resolved = Vec::with_capacity(self.descriptor.properties.len());
        for property in self.descriptor.properties {
            let before = resolved.len();
            resolved.extend(
                self.columns
                    .values()
                    .filter(|c| c.property.name == property.name)
                    .map(PropertyColumn::mapped),
            );
            if resolved.len() > before {
                continue;
            }
            let column_name = property.column_name();
            if self
                .columns
                .keys()
                .any(|k| k.eq_ignore_ascii_case(column_name))
            {
                continue;
            }
            resolved.push(PropertyColumn::unmapped(property));
        }
        resolved
    }

    /// Columns carrying the key role, mapped or taken from the descriptor.
    pub fn key_columns(&self) -> impl Iterator<Item = PropertyColumn<'_>> {
        self.property_columns()
            .into_iter()
            .filter(|c| c.is_primary_key)
    }

    /// Column names read by a default SELECT (ignored columns excluded).
    pub fn selectable_columns(&self) -> Vec<&str> {
        self.property_columns()
            .into_iter()
            .filter(|c| !c.is_ignored)
            .map(|c| c.column_name)
            .collect()
    }

    /// Columns written by INSERT (generated and ignored excluded).
    pub fn insertable_columns(&self) -> impl Iterator<Item = PropertyColumn<'_>> {
        self.property_columns()
            .into_iter()
            .filter(PropertyColumn::is_writable)
    }

    /// Columns written by UPDATE: writable, not a key, and not in `excluded`.
    pub fn updatable_columns<'a>(
        &'a self,
        excluded: &'a [&str],
    ) -> impl Iterator<Item = PropertyColumn<'a>> {
        self.property_columns().into_iter().filter(move |c| {
            c.is_writable()
                && !c.is_primary_key
                && !excluded.iter().any(|e| e.eq_ignore_ascii_case(c.column_name))
        })
    }
}

/// A model property as read or written through a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyColumn<'a> {
    pub column_name: &'a str,
    pub property: &'static PropertyDescriptor,
    pub is_primary_key: bool,
    pub is_database_generated: bool,
    pub is_ignored: bool,
    /// Registered on the table rather than taken from the descriptor.
    pub is_mapped: bool,
}

impl<'a> PropertyColumn<'a> {
    fn mapped(column: &'a Column) -> Self {
        Self {
            column_name: &column.column_name,
            property: column.property,
            is_primary_key: column.is_primary_key(),
            is_database_generated: column.is_database_generated,
            is_ignored: column.is_ignored,
            is_mapped: true,
        }
    }

    fn unmapped(property: &'static PropertyDescriptor) -> Self {
        Self {
            column_name: property.column_name(),
            property,
            is_primary_key: property.is_key,
            is_database_generated: property.is_database_generated,
            is_ignored: property.is_ignored,
            is_mapped: false,
        }
    }

    pub fn property_name(&self) -> &'static str {
        self.property.name
    }

    /// Included in INSERT / UPDATE statements.
    pub fn is_writable(&self) -> bool {
        !self.is_database_generated && !self.is_ignored
    }
}
