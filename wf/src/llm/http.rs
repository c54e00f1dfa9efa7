//! JSON-over-HTTPS transport shared by the model clients
//!
//! Retries are opt-in: with `max-retries: 0` the first failure is returned.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::LlmError;
use crate::config::LlmConfig;

const INITIAL_BACKOFF_MS: u64 = 1000;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Backoff before retry `attempt` (1-based)
pub(crate) fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS * 2u64.pow(attempt.saturating_sub(1))
}

pub(crate) struct Transport {
    http: Client,
    timeout: Duration,
    max_retries: u32,
}

impl Transport {
    pub(crate) fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            timeout,
            max_retries: config.max_retries,
        })
    }

    /// Transport that is never sent on; for request-building tests
    #[cfg(test)]
    pub(crate) fn offline() -> Self {
        Self {
            http: Client::new(),
            timeout: Duration::from_secs(120),
            max_retries: 0,
        }
    }

    fn classify(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(e)
        }
    }

    /// POST `body` to `url` and decode the JSON reply
    ///
    /// `auth` adds the provider's credential and version headers.
    pub(crate) async fn post<T, F>(&self, url: &str, body: &Value, auth: F) -> Result<T, LlmError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        debug!(%url, max_retries = self.max_retries, "Transport::post: called");
        let mut attempt = 0;
        loop {
            let outcome = match self.send_once(url, body, &auth).await {
                Ok(response) => response.json::<T>().await.map_err(|e| self.classify(e)),
                Err(e) => Err(e),
            };
            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = backoff_ms(attempt);
                    warn!(attempt, backoff_ms = backoff, error = %e, "Transport::post: retrying");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once<F>(&self, url: &str, body: &Value, auth: &F) -> Result<Response, LlmError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let request = auth(self.http.post(url).header("content-type", "application/json").json(body));
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            debug!(secs, "Transport::send_once: rate limited");
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(secs),
            });
        }

        let message = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Transport::send_once: API error");
        Err(LlmError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_ms(1), 1000);
        assert_eq!(backoff_ms(2), 2000);
        assert_eq!(backoff_ms(3), 4000);
    }

    #[test]
    fn test_transport_from_config() {
        let config = LlmConfig {
            timeout_ms: 5_000,
            max_retries: 2,
            ..LlmConfig::default()
        };
        let transport = Transport::from_config(&config).unwrap();
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.max_retries, 2);
    }
}
