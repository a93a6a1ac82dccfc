//! Error types for easydb

use std::fmt;
use thiserror::Error;

/// Result type alias for easydb operations
pub type DbResult<T> = Result<T, DbError>;

/// Boxed error returned by driver adapters.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Execution phase in which a driver failure happened.
///
/// Carried by [`DbError::Execution`] and by every [`crate::ErrorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Creating the driver connection from the configured connection string.
    Config,
    /// Opening the connection.
    Open,
    /// Closing the connection.
    Close,
    /// Handing command text to the driver.
    CreateCommand,
    /// Reading every row of a result.
    ReadAll,
    /// Reading the first row of a result.
    ReadOne,
    /// Executing a statement for its affected-row count.
    NonQuery,
    /// Executing a statement for a single scalar value.
    Scalar,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Config => "config",
            Phase::Open => "open",
            Phase::Close => "close",
            Phase::CreateCommand => "create_command",
            Phase::ReadAll => "read_all",
            Phase::ReadOne => "read_one",
            Phase::NonQuery => "non_query",
            Phase::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// Error types for query construction, mapping and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Bad provider / connection string / missing dialect
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No dialect registered for the provider key
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Empty identifier, missing required input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Name does not match the identifier pattern
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Operation attempted before a driver was configured
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Blank command text
    #[error("Command text cannot be empty")]
    InvalidCommandText,

    /// Condition variant cannot produce the requested value or fragment
    #[error("Unsupported condition: {0}")]
    UnsupportedCondition(String),

    /// Malformed ORDER BY specification
    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    /// A column name was registered twice on one table
    #[error("Column '{column}' is already mapped on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// No mapping registered and discovery is disabled
    #[error("No table mapping registered for {0}")]
    NotMapped(String),

    /// Value could not be converted to the target kind
    #[error("Cannot convert {from} to {to}: {message}")]
    Conversion {
        from: String,
        to: String,
        message: String,
    },

    /// Update matched no row while a concurrency check was requested
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Failure reported by the driver
    #[error("Execution error during {phase}: {source}")]
    Execution {
        phase: Phase,
        #[source]
        source: DriverError,
    },
}

impl DbError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid sort error
    pub fn invalid_sort(message: impl Into<String>) -> Self {
        Self::InvalidSort(message.into())
    }

    /// Create a conversion error
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }

    /// Wrap a driver failure with the phase it happened in
    pub fn execution(phase: Phase, source: DriverError) -> Self {
        Self::Execution { phase, source }
    }

    /// The execution phase, if this is a driver failure
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Execution { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Check if this error came from the driver
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Check if this is an invalid sort error
    pub fn is_invalid_sort(&self) -> bool {
        matches!(self, Self::InvalidSort(_))
    }

    /// Check if this is an unknown provider error
    pub fn is_unknown_provider(&self) -> bool {
        matches!(self, Self::UnknownProvider(_))
    }

    /// Check if this is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}
