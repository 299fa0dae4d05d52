//! Request/response shapes for the abstract chat endpoint.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Input to a [`crate::ChatBackend::send`] call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(model: impl Into<String>, temperature: f64, messages: Vec<Message>) -> Self {
        Self { model: model.into(), temperature, messages }
    }
}

/// Token usage as reported by the provider, prior to cost computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Result of a chat-endpoint invocation: text plus an optional usage record.
///
/// `usage` is `None` when the provider omits it; the Token Accountant
/// degrades that to an all-zero [`pipeline_types::TokenUsage`] rather than
/// failing.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub usage: Option<ProviderUsage>,
    pub model: String,
}
