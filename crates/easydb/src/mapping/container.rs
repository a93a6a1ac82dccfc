use super::intermediate::IntermediateTable;
use super::table::Table;
use crate::error::{DbError, DbResult};
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// What [`MappingContainer::get`] does for a model without a registered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultMappingBehavior {
    /// Discover the full mapping from the model descriptor and cache it.
    #[default]
    ReflectionDiscovery,
    /// Cache a table holding only the key-marked properties.
    CreateMinimalTableWithPrimaryKeyOnly,
    /// Fail with [`DbError::NotMapped`].
    None,
}

/// Registry of table mappings keyed by model type.
///
/// Reads take a shared lock; registration takes the write lock. Configure the
/// registry before handing it to concurrent callers.
#[derive(Debug, Default)]
pub struct MappingContainer {
    behavior: DefaultMappingBehavior,
    tables: RwLock<HashMap<TypeId, Arc<Table>>>,
    intermediates: RwLock<HashMap<String, Arc<IntermediateTable>>>,
}

static GLOBAL: LazyLock<Arc<MappingContainer>> =
    LazyLock::new(|| Arc::new(MappingContainer::default()));

impl MappingContainer {
    pub fn new(behavior: DefaultMappingBehavior) -> Self {
        Self {
            behavior,
            tables: RwLock::default(),
            intermediates: RwLock::default(),
        }
    }

    /// Process-wide registry using [`DefaultMappingBehavior::ReflectionDiscovery`].
    pub fn global() -> Arc<MappingContainer> {
        Arc::clone(&GLOBAL)
    }

    pub fn behavior(&self) -> DefaultMappingBehavior {
        self.behavior
    }

    /// Start a table mapping for `M`; pass the finished table to [`Self::register`].
    pub fn set_table<M: Model>(&self, name: &str) -> DbResult<Table> {
        Table::new::<M>(name)
    }

    /// Register (or replace) the mapping for the table's model type.
    pub fn register(&self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        let previous = self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.model_type(), Arc::clone(&table));
        if previous.is_some() {
            tracing::debug!(
                target: "easydb.mapping",
                model = table.descriptor().type_name,
                table = table.name(),
                "replaced table mapping"
            );
        }
        table
    }

    /// Registered mapping for `M`, without applying the default behavior.
    pub fn try_get<M: Model>(&self) -> Option<Arc<Table>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<M>())
            .cloned()
    }

    /// Mapping for `M`, applying the default behavior on a miss.
    pub fn get<M: Model>(&self) -> DbResult<Arc<Table>> {
        if let Some(table) = self.try_get::<M>() {
            return Ok(table);
        }
        let table = match self.behavior {
            DefaultMappingBehavior::ReflectionDiscovery => Table::discover::<M>()?,
            DefaultMappingBehavior::CreateMinimalTableWithPrimaryKeyOnly => Table::minimal::<M>()?,
            DefaultMappingBehavior::None => {
                return Err(DbError::NotMapped(M::descriptor().type_name.to_string()));
            }
        };
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            tables.entry(TypeId::of::<M>()).or_insert_with(|| Arc::new(table)),
        ))
    }

    /// Registered mapping whose table name matches `name` (case-insensitive).
    pub fn get_by_table_name(&self, name: &str) -> Option<Arc<Table>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn contains<M: Model>(&self) -> bool {
        self.try_get::<M>().is_some()
    }

    /// Remove the mapping for `M`.
    pub fn unregister<M: Model>(&self) -> Option<Arc<Table>> {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<M>())
    }

    /// Register (or replace) a join table mapping.
    pub fn set_intermediate_table(&self, table: IntermediateTable) -> Arc<IntermediateTable> {
        let table = Arc::new(table);
        self.intermediates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.name().to_ascii_lowercase(), Arc::clone(&table));
        table
    }

    pub fn get_intermediate_table(&self, name: &str) -> Option<Arc<IntermediateTable>> {
        self.intermediates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Drop every registered mapping.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.intermediates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
