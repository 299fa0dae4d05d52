//! Canonical data model shared by every crate in the workspace.
//!
//! This crate owns the entities described in the pipeline's data model: the
//! [`Issue`] input record, the per-stage output shapes, the token/cost
//! accounting types, the transient [`RunState`], the durable
//! [`PipelineResult`] artifact, the [`RunIndexRow`] persisted alongside it,
//! and the [`PipelineError`] taxonomy threaded through every other crate.
//!
//! No other crate in the workspace should redefine these types.

pub mod error;
pub mod exit_codes;
pub mod issue;
pub mod result;
pub mod run_state;
pub mod stage_output;
pub mod tokens;

pub use error::{ErrorKind, PipelineError, StageFailureSubkind};
pub use issue::{Issue, IssueSource};
pub use result::{PipelineResult, ResultMetadata, RunIndexRow};
pub use run_state::RunState;
pub use stage_output::{DevOutput, FileArtifact, PmOutput, QaOutput, StageName, Verdict};
pub use tokens::{EfficiencyMetrics, RunTokens, StageTokens, TokenUsage};

/// The sentinel string every stage's fallback record carries so downstream
/// consumers can detect structured-output degradation.
pub const DEGRADED_OUTPUT_SENTINEL: &str = "structured-output parse failed";
