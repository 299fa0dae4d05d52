//! The durable [`PipelineResult`] artifact and its run-index row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::issue::Issue;
use crate::stage_output::{DevOutput, PmOutput, QaOutput, Verdict};
use crate::tokens::RunTokens;

/// Metadata block embedded in a [`PipelineResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub run_id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub duration_seconds: f64,
    pub token_usage: RunTokens,
    pub implementation_notes: Vec<String>,
}

/// The immutable output artifact of a successfully completed run.
///
/// Only produced when all three stages completed, possibly with fallback
/// outputs. Field declaration order is the wire format: the struct is
/// serialized with `serde_json` using the persistence layer's pretty-printer,
/// which preserves declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub issue: Issue,
    pub pm: PmOutput,
    pub dev: DevOutput,
    pub qa: QaOutput,
    pub metadata: ResultMetadata,
}

/// One row in the relational run index, keyed by run id.
///
/// Never overwritten: exactly one row per terminated run, success or error.
#[derive(Debug, Clone)]
pub struct RunIndexRow {
    pub run_id: String,
    pub issue_id: String,
    pub verdict: Option<Verdict>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub error: Option<String>,
    /// The Result JSON filename this row points at, or `None` for an
    /// error-terminated run that never reached Finalize's Result assembly.
    pub result_filename: Option<String>,
}
