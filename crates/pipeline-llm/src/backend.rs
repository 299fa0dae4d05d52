//! The abstract chat endpoint contract every provider backend implements.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse};

/// The external collaborator the core consumes: given an ordered list of
/// role-tagged messages, returns text plus a token-usage record.
///
/// Prompt wording, provider auth, and the network call itself are treated as
/// configuration/external concerns — this trait is the seam at which they
/// are deliberately excluded from the orchestration core.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Invoke the chat endpoint.
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// The provider name used in error messages and logs (e.g. `"anthropic"`).
    fn provider_name(&self) -> &str;
}
