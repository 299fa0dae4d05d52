//! The pipeline-wide error taxonomy.
//!
//! Every component-specific error type in this workspace converts into
//! [`PipelineError`] at its crate boundary via `From`, so that the CLI,
//! the folder watcher, and the JSON-RPC server share one mapping from
//! failure to `ErrorKind` / exit code.

use thiserror::Error;

use crate::stage_output::StageName;

/// Subkind of a [`PipelineError::StageFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFailureSubkind {
    /// The chat endpoint call failed at the transport layer.
    Transport,
    /// The chat endpoint call exceeded its per-stage deadline.
    Timeout,
    /// The parser gave up and the caller declined the documented fallback.
    ///
    /// Not the default path: ordinarily a parse failure downgrades to a
    /// fallback record and is logged as `degraded_output`, never returned
    /// as an error.
    Unparsable,
}

impl std::fmt::Display for StageFailureSubkind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unparsable => write!(f, "unparsable"),
        }
    }
}

/// The error kinds surfaced over JSON-RPC and mapped to CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    UpstreamFailed,
    StageFailed,
    PersistenceFailed,
}

impl ErrorKind {
    /// The wire value used in JSON-RPC error responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::UpstreamFailed => "upstream_failed",
            Self::StageFailed => "stage_failed",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

/// The single error type threaded through every crate in the workspace.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream failed: {0}")]
    UpstreamFailed(String),

    #[error("stage {stage} failed ({subkind}): {message}")]
    StageFailed {
        stage: StageName,
        subkind: StageFailureSubkind,
        message: String,
    },

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl PipelineError {
    /// Classify this error for JSON-RPC responses and exit-code mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UpstreamFailed(_) => ErrorKind::UpstreamFailed,
            Self::StageFailed { .. } => ErrorKind::StageFailed,
            Self::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
        }
    }
}
