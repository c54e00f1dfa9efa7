//! OpenAI Chat Completions client
//!
//! Works with OpenAI-compatible hosts such as Groq. A prefill is sent as a
//! trailing assistant message; hosts that ignore it return a full value,
//! which the extractor accepts as well.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::http::Transport;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Client for OpenAI-compatible chat endpoints
pub struct OpenAIClient {
    model: String,
    bearer: String,
    endpoint: String,
    max_tokens: u32,
    transport: Transport,
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "OpenAIClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        Ok(Self {
            model: config.model.clone(),
            bearer: format!("Bearer {}", api_key),
            endpoint: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            transport: Transport::from_config(config)?,
        })
    }

    /// Reasoning models take `max_completion_tokens` instead of `max_tokens`
    fn token_field(&self) -> &'static str {
        if ["gpt-5", "o1", "o3"].iter().any(|p| self.model.starts_with(p)) {
            "max_completion_tokens"
        } else {
            "max_tokens"
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let system = json!({"role": "system", "content": request.system_prompt});
        let messages: Vec<Value> = std::iter::once(system)
            .chain(
                request
                    .wire_messages()
                    .into_iter()
                    .map(|m| json!({"role": m.role, "content": m.content})),
            )
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        body[self.token_field()] = json!(request.max_tokens.min(self.max_tokens));
        body
    }

    fn into_completion(reply: ChatReply) -> Result<CompletionResponse, LlmError> {
        let Some(choice) = reply.choices.into_iter().next() else {
            return Err(LlmError::InvalidResponse("No choices in response".to_string()));
        };

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref().unwrap_or("stop")),
            usage: reply
                .usage
                .map(|u| TokenUsage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "OpenAIClient::complete: called");
        let body = self.request_body(&request);
        let reply: ChatReply = self
            .transport
            .post(&self.endpoint, &body, |req| req.header("Authorization", &self.bearer))
            .await?;
        Self::into_completion(reply)
    }
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
