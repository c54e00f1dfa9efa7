//! Search provider contract

use async_trait::async_trait;
use serde_json::Value;

use super::SearchError;

/// Search engines the capabilities query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    GoogleFlights,
    GoogleHotels,
    GoogleEvents,
    /// Plain web search
    Google,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::GoogleFlights => "google_flights",
            Engine::GoogleHotels => "google_hotels",
            Engine::GoogleEvents => "google_events",
            Engine::Google => "google",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search request: an engine plus ordered query parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub engine: Engine,
    pub params: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            params: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a parameter when a value is present
    pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Value of a parameter, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A search backend
///
/// Implementations return the provider's raw JSON; normalization happens in
/// the capabilities.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let params = SearchParams::new(Engine::GoogleFlights)
            .with("departure_id", "OAK")
            .with_opt("return_date", None::<String>)
            .with_opt("currency", Some("USD"));
        assert_eq!(params.get("departure_id"), Some("OAK"));
        assert_eq!(params.get("return_date"), None);
        assert_eq!(params.params.len(), 2);
        assert_eq!(params.engine.to_string(), "google_flights");
    }
}
