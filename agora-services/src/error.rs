use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Transport failures and error statuses are worth another attempt;
    /// a body we cannot decode is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Upstream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_status_errors_retry() {
        let upstream = ServiceError::Upstream {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(upstream.is_retryable());
        assert!(!ServiceError::InvalidResponse("no choices".into()).is_retryable());
        assert!(!ServiceError::NotConfigured("OPENAI_API_KEY").is_retryable());
    }

    #[test]
    fn upstream_display() {
        let err = ServiceError::Upstream {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.to_string(), "upstream returned 429: slow down");
    }
}
