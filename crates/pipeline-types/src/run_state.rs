//! [`RunState`]: the transient, pipeline-local record a single run advances
//! through `LoadIssue → PM → Dev → QA → Finalize`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::issue::Issue;
use crate::result::PipelineResult;
use crate::stage_output::{DevOutput, PmOutput, QaOutput};
use crate::tokens::StageTokens;

/// The in-memory record carrying one issue through the pipeline.
///
/// Stage slots fill in strictly in order: `pm` before `dev`, `dev` before
/// `qa`. Once [`RunState::set_error`] has been called, the setters below
/// become no-ops: subsequent stages still execute but pass the state through
/// unchanged rather than overwriting the error.
#[derive(Debug, Clone)]
pub struct RunState {
    run_id: String,
    started_at: DateTime<Utc>,
    source_file: Option<PathBuf>,
    issue: Option<Issue>,
    pm: Option<PmOutput>,
    dev: Option<DevOutput>,
    qa: Option<QaOutput>,
    stage_tokens: Vec<StageTokens>,
    error: Option<String>,
    result: Option<PipelineResult>,
}

impl RunState {
    #[must_use]
    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>, source_file: Option<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            source_file,
            issue: None,
            pm: None,
            dev: None,
            qa: None,
            stage_tokens: Vec::new(),
            error: None,
            result: None,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn source_file(&self) -> Option<&PathBuf> {
        self.source_file.as_ref()
    }

    #[must_use]
    pub fn issue(&self) -> Option<&Issue> {
        self.issue.as_ref()
    }

    #[must_use]
    pub fn pm(&self) -> Option<&PmOutput> {
        self.pm.as_ref()
    }

    #[must_use]
    pub fn dev(&self) -> Option<&DevOutput> {
        self.dev.as_ref()
    }

    #[must_use]
    pub fn qa(&self) -> Option<&QaOutput> {
        self.qa.as_ref()
    }

    #[must_use]
    pub fn stage_tokens(&self) -> &[StageTokens] {
        &self.stage_tokens
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn result(&self) -> Option<&PipelineResult> {
        self.result.as_ref()
    }

    /// `LoadIssue` transition: attaches the loaded issue. No-ops once an
    /// error is present.
    pub fn set_issue(&mut self, issue: Issue) {
        if self.has_error() {
            return;
        }
        self.issue = Some(issue);
    }

    /// `PM` transition. Debug-asserts the ordering invariant: issue must be
    /// loaded, dev/qa must still be empty.
    pub fn set_pm(&mut self, pm: PmOutput) {
        if self.has_error() {
            return;
        }
        debug_assert!(self.issue.is_some(), "pm set before issue loaded");
        debug_assert!(self.dev.is_none() && self.qa.is_none(), "pm set out of order");
        self.pm = Some(pm);
    }

    /// `Dev` transition. Debug-asserts `pm` is already filled.
    pub fn set_dev(&mut self, dev: DevOutput) {
        if self.has_error() {
            return;
        }
        debug_assert!(self.pm.is_some(), "dev set before pm");
        debug_assert!(self.qa.is_none(), "dev set out of order");
        self.dev = Some(dev);
    }

    /// `QA` transition. Debug-asserts `dev` is already filled.
    pub fn set_qa(&mut self, qa: QaOutput) {
        if self.has_error() {
            return;
        }
        debug_assert!(self.dev.is_some(), "qa set before dev");
        self.qa = Some(qa);
    }

    /// Record a stage's token usage. This happens even on a stage whose
    /// response goes on to fail parsing, since the chat endpoint call still
    /// consumed tokens regardless of whether the response was usable.
    pub fn record_stage_tokens(&mut self, tokens: StageTokens) {
        if self.has_error() {
            return;
        }
        self.stage_tokens.push(tokens);
    }

    /// Set a terminal error. Once set, all further `set_*` calls above
    /// become no-ops, implementing the short-circuit.
    pub fn set_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    /// Attach the assembled [`PipelineResult`]. Only meaningful when `error`
    /// is absent: a run that terminated on error produces no Result.
    pub fn set_result(&mut self, result: PipelineResult) {
        if self.has_error() {
            return;
        }
        self.result = Some(result);
    }
}
