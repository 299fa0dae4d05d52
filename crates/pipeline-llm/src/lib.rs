//! The abstract chat endpoint, its concrete provider backends, the pricing
//! table, and the Token Accountant.

mod accountant;
mod backend;
mod error;
mod pricing;
mod providers;
mod types;

pub use accountant::TokenAccountant;
pub use backend::ChatBackend;
pub use error::LlmError;
pub use pricing::{ModelPrice, PricingTable};
pub use providers::{AnthropicBackend, AzureBackend, OpenAiBackend};
pub use types::{ChatRequest, ChatResponse, Message, ProviderUsage, Role};
