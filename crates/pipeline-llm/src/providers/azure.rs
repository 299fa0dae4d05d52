use async_trait::async_trait;

use crate::backend::ChatBackend;
use crate::error::LlmError;
use crate::providers::openai::OpenAiBackend;
use crate::types::{ChatRequest, ChatResponse};

const AZURE_API_VERSION: &str = "2024-06-01";

/// Azure OpenAI backend.
///
/// Azure's wire format is the same chat-completions shape as OpenAI's, just
/// addressed by `(endpoint, deployment)` instead of a model name and
/// authenticated with `api-key` rather than a bearer token. Rather than
/// duplicate the response parsing, this wraps [`OpenAiBackend`] pointed at
/// the deployment-specific URL.
pub struct AzureBackend {
    inner: OpenAiBackend,
}

impl AzureBackend {
    #[must_use]
    pub fn new(api_key: impl Into<String>, endpoint: &str, deployment: &str) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            AZURE_API_VERSION,
        );
        Self { inner: OpenAiBackend::new(api_key, Some(url)) }
    }
}

#[async_trait]
impl ChatBackend for AzureBackend {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.inner.send(request).await.map_err(|e| match e {
            LlmError::Transport { message, .. } => LlmError::Transport { provider: self.provider_name().to_string(), message },
            LlmError::Timeout { .. } => LlmError::Timeout { provider: self.provider_name().to_string() },
            LlmError::Provider { message, .. } => LlmError::Provider { provider: self.provider_name().to_string(), message },
        })
    }

    fn provider_name(&self) -> &str {
        "azure"
    }
}
