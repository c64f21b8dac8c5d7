//! Validation error types

use std::fmt;

/// Validation error for request models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Number outside its allowed range
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// String doesn't match required format
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a character count against `min..=max`.
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 && min > 0 {
        return Err(ValidationError::Empty { field });
    }
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "prompt",
            max: 255,
        };
        assert_eq!(err.to_string(), "prompt exceeds maximum length of 255 characters");

        let err = ValidationError::OutOfRange {
            field: "limit",
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "limit must be between 1 and 100");
    }

    #[test]
    fn length_counts_characters() {
        assert!(check_length("username", "héllo", 5, 20).is_ok());
        assert_eq!(
            check_length("username", "", 5, 20),
            Err(ValidationError::Empty { field: "username" })
        );
        assert_eq!(
            check_length("username", "abc", 5, 20),
            Err(ValidationError::TooShort {
                field: "username",
                min: 5
            })
        );
    }
}
