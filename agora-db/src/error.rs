//! Database error taxonomy

use crate::session::SessionState;

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Missing or malformed connection URL. Never retried.
    #[error("database configuration error: {0}")]
    Configuration(String),

    /// Database not reachable (yet)
    #[error("database unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// Statement failed inside a unit of work
    #[error("database error: {0}")]
    Operation(#[from] sqlx::Error),

    /// Operation attempted on a session that no longer accepts it
    #[error("cannot {operation} a {state} session")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },

    /// Schema initializer gave up
    #[error("schema initialization failed after {attempts} attempts: {source}")]
    InitializationFailed {
        attempts: u32,
        #[source]
        source: Box<DbError>,
    },

    /// Entity registration rejected
    #[error("schema registry error: {0}")]
    Registry(String),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("at least one search parameter is required")]
    MissingFilter,
}

impl DbError {
    /// Classify an error raised while opening a connection.
    pub(crate) fn from_connect(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => Self::Configuration(e.to_string()),
            other => Self::Connectivity(other),
        }
    }

    /// Classify an error raised by a write, surfacing unique violations.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::Conflict(db.message().to_owned()),
            _ => Self::Operation(err),
        }
    }

    /// Whether the schema initializer should try again after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Configuration(_) | Self::Registry(_) | Self::InvalidState { .. }
        )
    }
}
