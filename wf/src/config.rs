//! Wayfarer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::UserProfile;
use crate::scheduler::SchedulerConfig;

/// Main Wayfarer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model used to turn a goal into capability calls
    pub planner: LlmConfig,

    /// Model used to turn search results into an itinerary
    pub synthesizer: LlmConfig,

    /// Model used by `refine`; `null` refines without a model
    pub refiner: Option<LlmConfig>,

    /// Search provider configuration
    pub search: SearchConfig,

    /// Default user profile
    pub profile: UserProfile,

    /// Conflict resolution settings
    pub scheduler: SchedulerConfig,

    /// Log level when `--log-level` is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: LlmConfig::default(),
            synthesizer: LlmConfig {
                max_tokens: 4096,
                ..LlmConfig::default()
            },
            refiner: Some(LlmConfig::groq()),
            search: SearchConfig::default(),
            profile: UserProfile::default(),
            scheduler: SchedulerConfig::default(),
            log_level: None,
        }
    }
}

impl Config {
    /// Validate configuration before planning
    ///
    /// Checks that the API key environment variables for the planner,
    /// synthesizer and search provider are set.
    pub fn validate(&self) -> Result<()> {
        for (role, llm) in [("planner", &self.planner), ("synthesizer", &self.synthesizer)] {
            if std::env::var(&llm.api_key_env).is_err() {
                return Err(eyre::eyre!(
                    "{} API key not found. Set the {} environment variable.",
                    role,
                    llm.api_key_env
                ));
            }
        }
        if std::env::var(&self.search.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Search API key not found. Set the {} environment variable.",
                self.search.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .wayfarer.yml
        let local_config = PathBuf::from(".wayfarer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/wayfarer/wayfarer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wayfarer").join("wayfarer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "anthropic" or "openai" (any OpenAI-compatible host)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures; 0 disables retrying
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-haiku-20241022".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            timeout_ms: 120_000,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Groq's OpenAI-compatible endpoint, the default refiner
    pub fn groq() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            max_tokens: 4096,
            temperature: 0.3,
            ..Self::default()
        }
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("API key not found. Set the {} environment variable.", self.api_key_env))
    }

    /// Whether the API key environment variable is set
    pub fn has_api_key(&self) -> bool {
        std::env::var(&self.api_key_env).is_ok_and(|k| !k.trim().is_empty())
    }
}

/// Search provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SerpApi base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Interface language
    pub hl: String,

    /// Country
    pub gl: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures; 0 disables retrying
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com".to_string(),
            api_key_env: "SERPAPI_API_KEY".to_string(),
            hl: "en".to_string(),
            gl: "us".to_string(),
            timeout_ms: 30_000,
            max_retries: 0,
        }
    }
}
