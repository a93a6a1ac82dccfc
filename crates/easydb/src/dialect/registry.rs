use super::{MySqlDialect, PostgresDialect, QueryService, SqlServerDialect, SqliteDialect};
use crate::error::{DbError, DbResult};
use crate::guard::not_empty;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Provider key → dialect. Keys are compared case-insensitively.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    dialects: RwLock<HashMap<String, Arc<dyn QueryService>>>,
}

static GLOBAL: LazyLock<DialectRegistry> = LazyLock::new(DialectRegistry::with_defaults);

impl DialectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `sqlserver`, `mysql`, `postgres` and `sqlite`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_dialect(SqlServerDialect);
        registry.register_dialect(MySqlDialect);
        registry.register_dialect(PostgresDialect);
        registry.register_dialect(SqliteDialect);
        registry
    }

    /// Process-wide registry, seeded with the default dialects.
    pub fn global() -> &'static DialectRegistry {
        &GLOBAL
    }

    /// Register `dialect` under `provider`, replacing any previous entry.
    pub fn register(&self, provider: &str, dialect: Arc<dyn QueryService>) -> DbResult<()> {
        let key = not_empty(provider, "provider")?.trim().to_ascii_lowercase();
        self.dialects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, dialect);
        Ok(())
    }

    fn register_dialect<D: QueryService + 'static>(&self, dialect: D) {
        self.dialects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dialect.name().to_string(), Arc::new(dialect));
    }

    pub fn has_dialect(&self, provider: &str) -> bool {
        self.dialects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&provider.trim().to_ascii_lowercase())
    }

    pub fn get(&self, provider: &str) -> DbResult<Arc<dyn QueryService>> {
        self.dialects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DbError::UnknownProvider(provider.to_string()))
    }

    /// Registered provider keys, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .dialects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}
