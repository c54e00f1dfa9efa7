//! Anthropic Messages API client
//!
//! Supports assistant prefill: the prefill is sent as a trailing assistant
//! message and the reply continues from it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::http::Transport;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";

/// Client for Claude models
pub struct AnthropicClient {
    model: String,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
    transport: Transport,
}

impl AnthropicClient {
    /// Build a client; the API key comes from the configured env var
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            transport: Transport::from_config(config)?,
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "temperature": request.temperature,
            "system": request.system_prompt,
            "messages": request.wire_messages(),
        })
    }

    fn into_completion(reply: MessagesReply) -> CompletionResponse {
        let content: String = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        CompletionResponse {
            content,
            stop_reason: StopReason::from_anthropic(reply.stop_reason.as_deref().unwrap_or("end_turn")),
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "AnthropicClient::complete: called");
        let body = self.request_body(&request);
        let reply: MessagesReply = self
            .transport
            .post(&self.endpoint, &body, |req| {
                req.header("x-api-key", &self.api_key)
                    .header("anthropic-version", API_VERSION)
            })
            .await?;
        debug!(stop_reason = ?reply.stop_reason, "AnthropicClient::complete: reply received");
        Ok(Self::into_completion(reply))
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
