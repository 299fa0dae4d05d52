//! Errors raised by a [`crate::ChatBackend`] invocation.

use thiserror::Error;

/// Failure modes for a chat-endpoint call.
///
/// These map onto `PipelineError::StageFailed`'s subkinds at the Stage
/// Executor boundary: `Transport` and `Timeout` map directly; `Provider`
/// also maps to the `transport` subkind since, from the stage executor's
/// point of view, a provider error and a network error are both "the call
/// did not produce usable output".
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error calling {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} call exceeded its deadline")]
    Timeout { provider: String },

    #[error("{provider} rejected the request: {message}")]
    Provider { provider: String, message: String },
}
