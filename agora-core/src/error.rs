/// Structured error type for settings loading.
///
/// Library crates get a `thiserror` enum; the `agora` binary wraps it
/// with `anyhow` context.
use thiserror::Error;

/// Configuration could not be read or parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable set but not parseable
    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Result type alias for settings operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("DB_MAX_CONNECTIONS", "not a number");
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        assert!(err.to_string().contains("not a number"));
    }
}
