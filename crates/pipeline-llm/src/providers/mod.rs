//! Concrete [`crate::ChatBackend`] implementations.
//!
//! Each backend is a thin `reqwest` client; prompt construction, retries,
//! and streaming are explicitly out of scope.

mod anthropic;
mod azure;
mod openai;

pub use anthropic::AnthropicBackend;
pub use azure::AzureBackend;
pub use openai::OpenAiBackend;
