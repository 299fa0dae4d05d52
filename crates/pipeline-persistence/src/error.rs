//! Persistence failures (spec.md §4.4).
//!
//! Surfaced verbatim to the caller: the Pipeline State Machine treats these
//! as fatal for the run, but does not roll back prior side effects (the
//! Result file may exist even if indexing fails — logged, not retried).

use thiserror::Error;

use pipeline_types::PipelineError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write result file: {0}")]
    Write(String),

    #[error("run index store error: {0}")]
    Store(String),

    #[error("run id already indexed: {0}")]
    DuplicateRunId(String),
}

impl From<PersistenceError> for PipelineError {
    fn from(err: PersistenceError) -> Self {
        PipelineError::PersistenceFailed(err.to_string())
    }
}
