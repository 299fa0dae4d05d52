//! A method's domain-level failure: a `kind` drawn from spec.md §4.8's five
//! values plus the human-readable message embedded in its `result` object
//! (never the JSON-RPC `error` member — see `protocol.rs`).

use pipeline_types::{ErrorKind, PipelineError};

#[derive(Debug)]
pub struct RpcError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RpcError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl From<PipelineError> for RpcError {
    fn from(err: PipelineError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}
