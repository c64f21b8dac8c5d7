//! Stored file names and signed URL parameters

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::ValidationError;

const MAX_FILE_NAME_LEN: usize = 255;

/// Longest lifetime S3 accepts for a presigned URL (seven days)
const MAX_EXPIRES_IN: u64 = 7 * 24 * 3600;
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Single path segment: no slashes, no leading dot
static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").expect("invalid file name regex")
});

/// Validated object name within the storage folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName(String);

impl FileName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "file name" });
        }

        if s.len() > MAX_FILE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "file name",
                max: MAX_FILE_NAME_LEN,
            });
        }

        if !FILE_NAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "file name",
                reason: "must be letters, digits, dots, hyphens or underscores, not starting with a dot",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Query for GET /v1/files/{name}/url
#[derive(Debug, Default, Deserialize)]
pub struct UrlParams {
    pub expires_in: Option<u64>,
}

impl UrlParams {
    pub fn expires_in(&self) -> Result<Duration, ValidationError> {
        let secs = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        if secs == 0 || secs > MAX_EXPIRES_IN {
            return Err(ValidationError::OutOfRange {
                field: "expires_in",
                min: 1,
                max: MAX_EXPIRES_IN as i64,
            });
        }
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(FileName::new("avatar.png").is_ok());
        assert!(FileName::new("report_2024-01.pdf").is_ok());
        assert!(FileName::new("README").is_ok());
    }

    #[test]
    fn rejects_paths_and_dotfiles() {
        for name in ["../etc/passwd", "a/b.txt", ".env", "with space.txt"] {
            assert!(
                matches!(FileName::new(name), Err(ValidationError::InvalidFormat { .. })),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn rejects_empty_and_long() {
        assert!(matches!(FileName::new(""), Err(ValidationError::Empty { .. })));
        let long = "a".repeat(256);
        assert!(matches!(FileName::new(&long), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn expiry_defaults_to_an_hour() {
        assert_eq!(
            UrlParams::default().expires_in().unwrap(),
            Duration::from_secs(3600)
        );
        let params = UrlParams {
            expires_in: Some(0),
        };
        assert!(params.expires_in().is_err());
    }
}
