//! SerpApi search client
//!
//! One GET to `{base-url}/search.json` per search, with the engine name, the
//! engine's parameters, locale settings and the API key as query parameters.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{SearchError, SearchParams, SearchProvider};
use crate::config::SearchConfig;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// SerpApi client
pub struct SerpApiClient {
    api_key: String,
    base_url: String,
    hl: String,
    gl: String,
    http: Client,
    max_retries: u32,
}

impl SerpApiClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        debug!(base_url = %config.base_url, "SerpApiClient::from_config: called");
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SearchError::MissingApiKey(config.api_key_env.clone()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            hl: config.hl.clone(),
            gl: config.gl.clone(),
            http,
            max_retries: config.max_retries,
        })
    }

    /// Query string for a search, without the API key
    fn build_query(&self, params: &SearchParams) -> Vec<(String, String)> {
        let mut query = vec![("engine".to_string(), params.engine.as_str().to_string())];
        query.extend(params.params.iter().cloned());
        if params.get("hl").is_none() {
            query.push(("hl".to_string(), self.hl.clone()));
        }
        if params.get("gl").is_none() {
            query.push(("gl".to_string(), self.gl.clone()));
        }
        query
    }

    async fn search_once(&self, url: &str, query: &[(String, String)]) -> Result<Value, SearchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(SearchError::Provider(error.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchError> {
        debug!(engine = %params.engine, "SerpApiClient::search: called");
        let url = format!("{}/search.json", self.base_url);
        let query = self.build_query(params);

        let mut attempt = 0;
        loop {
            match self.search_once(&url, &query).await {
                Ok(body) => {
                    debug!(engine = %params.engine, "SerpApiClient::search: success");
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff, error = %e, "SerpApiClient::search: retrying after transient error");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    debug!(engine = %params.engine, error = %e, "SerpApiClient::search: failed");
                    return Err(e);
                }
            }
        }
    }
}
