//! JSON HTTP client with exponential backoff
//!
//! Transport errors and non-success statuses are retried; a response body
//! that fails to decode is returned immediately.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ServiceError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exponential backoff: `base * 2^(attempt - 1)`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            max: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// Delay after the given 1-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.max, |d| d.min(self.max))
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    backoff: Backoff,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            backoff: Backoff::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B, headers: HeaderMap) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_retry(url, || {
            self.http.post(url).headers(headers.clone()).json(body)
        })
        .await
    }

    pub async fn get_json<T>(&self, url: &str, headers: HeaderMap) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_with_retry(url, || self.http.get(url).headers(headers.clone()))
            .await
    }

    async fn send_with_retry<T, F>(&self, url: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.backoff.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match Self::send_once(build()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(url, attempt, error = %e, "request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fast_backoff() -> Backoff {
        Backoff {
            max_attempts: 3,
            base: Duration::from_millis(1),
            max: Duration::from_millis(5),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::from_secs(2));
        assert_eq!(backoff.delay(4), Duration::from_secs(8));
        assert_eq!(backoff.delay(5), Duration::from_secs(10));
        assert_eq!(backoff.delay(64), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn retries_error_status_until_success() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/flaky",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    } else {
                        Ok(Json(serde_json::json!({"ok": true})))
                    }
                }
            }),
        );
        let base = serve(router).await;

        let client = HttpClient::new().unwrap().with_backoff(fast_backoff());
        let body: serde_json::Value = client
            .post_json(&format!("{}/flaky", base), &serde_json::json!({}), HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/down",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (StatusCode::BAD_GATEWAY, "upstream down") }
            }),
        );
        let base = serve(router).await;

        let client = HttpClient::new().unwrap().with_backoff(fast_backoff());
        let err = client
            .get_json::<serde_json::Value>(&format!("{}/down", base), HeaderMap::new())
            .await
            .unwrap_err();

        match err {
            ServiceError::Upstream { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn undecodable_body_is_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/text",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { "not json" }
            }),
        );
        let base = serve(router).await;

        let client = HttpClient::new().unwrap().with_backoff(fast_backoff());
        let err = client
            .get_json::<serde_json::Value>(&format!("{}/text", base), HeaderMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidResponse(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
