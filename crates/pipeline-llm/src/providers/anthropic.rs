use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::backend::ChatBackend;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, ProviderUsage, Role};

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicBackend {
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    model: String,
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let (system, messages): (Vec<_>, Vec<_>) =
            request.messages.iter().partition(|m| m.role == Role::System);
        let system_prompt = system.into_iter().map(|m| m.content.clone()).collect::<Vec<_>>().join("\n");

        let body = json!({
            "model": request.model,
            "max_tokens": 4096,
            "temperature": request.temperature,
            "system": system_prompt,
            "messages": messages.iter().map(|m| json!({
                "role": if m.role == Role::Assistant { "assistant" } else { "user" },
                "content": m.content,
            })).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport { provider: self.provider_name().to_string(), message: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                provider: self.provider_name().to_string(),
                message: format!("{status}: {text}"),
            });
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport { provider: self.provider_name().to_string(), message: e.to_string() })?;

        let text = parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join("");
        let usage = parsed.usage.map(|u| ProviderUsage { input_tokens: u.input_tokens, output_tokens: u.output_tokens });

        Ok(ChatResponse {
            text,
            usage,
            model: if parsed.model.is_empty() { request.model } else { parsed.model },
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}
