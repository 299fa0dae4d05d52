use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::backend::ChatBackend;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, ProviderUsage, Role};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat-completions backend.
///
/// A configurable `chat_base_url` lets this backend also serve any
/// OpenAI-compatible provider (Together, OpenRouter, a local proxy, …)
/// without a new `ChatBackend` impl.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: String,
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": request.messages.iter().map(|m| json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content,
            })).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
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

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport { provider: self.provider_name().to_string(), message: e.to_string() })?;

        let text = parsed.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default();
        let usage = parsed.usage.map(|u| ProviderUsage { input_tokens: u.prompt_tokens, output_tokens: u.completion_tokens });

        Ok(ChatResponse {
            text,
            usage,
            model: if parsed.model.is_empty() { request.model } else { parsed.model },
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
