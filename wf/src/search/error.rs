//! Search provider error types

use thiserror::Error;

/// Errors from a search provider call
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider answered but reported an error in its payload
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Network(_) => true,
            SearchError::Api { status, .. } => *status == 429 || *status >= 500,
            SearchError::MissingApiKey(_) | SearchError::Provider(_) | SearchError::Json(_) => false,
        }
    }
}
