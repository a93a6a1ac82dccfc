use crate::error::{DbError, DbResult};
use crate::mapping::DefaultMappingBehavior;
use serde::{Deserialize, Serialize};

/// When the `Db` opens and closes its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStrategy {
    /// Open before and close after every statement.
    #[default]
    Automatic,
    /// The caller opens and closes explicitly.
    Manual,
}

/// Configuration for [`crate::Db`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Provider key used to look up the dialect (e.g. `sqlserver`, `sqlite`).
    pub provider: String,
    /// Handed unchanged to the driver.
    pub connection_string: String,
    pub strategy: ConnectionStrategy,
    /// Applied when a model has no registered mapping.
    pub mapping_behavior: DefaultMappingBehavior,
}

impl DbConfig {
    pub fn new(provider: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    /// Set the connection strategy.
    pub fn strategy(mut self, strategy: ConnectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the default mapping behavior.
    pub fn mapping_behavior(mut self, behavior: DefaultMappingBehavior) -> Self {
        self.mapping_behavior = behavior;
        self
    }

    /// Fail with `Configuration` when the provider or connection string is blank.
    pub fn validate(&self) -> DbResult<()> {
        if self.provider.trim().is_empty() {
            return Err(DbError::configuration("provider is not set"));
        }
        if self.connection_string.trim().is_empty() {
            return Err(DbError::configuration("connection string is not set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_setters() {
        let config = DbConfig::new("sqlite", ":memory:")
            .strategy(ConnectionStrategy::Manual)
            .mapping_behavior(DefaultMappingBehavior::None);
        assert_eq!(config.strategy, ConnectionStrategy::Manual);
        assert_eq!(config.mapping_behavior, DefaultMappingBehavior::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_fields_fail_validation() {
        assert!(matches!(
            DbConfig::new("", "x").validate(),
            Err(DbError::Configuration(_))
        ));
        assert!(matches!(
            DbConfig::new("sqlite", " ").validate(),
            Err(DbError::Configuration(_))
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DbConfig = serde_json::from_str(
            r#"{"provider":"sqlserver","connection_string":"Server=.;","strategy":"manual"}"#,
        )
        .unwrap();
        assert_eq!(config.provider, "sqlserver");
        assert_eq!(config.strategy, ConnectionStrategy::Manual);
        assert_eq!(config.mapping_behavior, DefaultMappingBehavior::ReflectionDiscovery);
    }
}
