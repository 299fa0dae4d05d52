//! Failure modes for the Issue Source Set.
//!
//! Each variant is terminal for the caller; no retry is performed.

use thiserror::Error;

use pipeline_types::PipelineError;

#[derive(Debug, Error)]
pub enum IssueSourceError {
    #[error("issue file not found: {0}")]
    MissingFile(String),

    #[error("malformed issue json: {0}")]
    MalformedJson(String),

    #[error("issue failed schema validation: {0}")]
    SchemaViolation(String),

    #[error("issue tracker returned {status}: {body}")]
    HttpNonSuccess { status: u16, body: String },

    #[error("issue tracker response body was unparseable: {0}")]
    HttpBodyUnparseable(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

impl From<IssueSourceError> for PipelineError {
    fn from(err: IssueSourceError) -> Self {
        match err {
            IssueSourceError::MissingFile(msg) => PipelineError::NotFound(msg),
            IssueSourceError::MalformedJson(msg) | IssueSourceError::SchemaViolation(msg) => {
                PipelineError::InvalidInput(msg)
            }
            IssueSourceError::HttpNonSuccess { status, body } => {
                PipelineError::UpstreamFailed(format!("http {status}: {body}"))
            }
            IssueSourceError::HttpBodyUnparseable(msg) => PipelineError::UpstreamFailed(msg),
            IssueSourceError::MissingCredential(msg) => PipelineError::InvalidInput(msg),
        }
    }
}
