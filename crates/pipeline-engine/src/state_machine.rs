//! The Pipeline State Machine: `LoadIssue → PM → Dev → QA → Finalize →
//! Terminal`, with unconditional forward edges and error short-circuit.

use std::path::PathBuf;

use camino::Utf8Path;
use chrono::Utc;

use pipeline_issues::{IssueFetcher, IssueSelector};
use pipeline_llm::{ChatBackend, TokenAccountant};
use pipeline_persistence::{write_result, RunIndexStore};
use pipeline_types::{PipelineResult, ResultMetadata, RunIndexRow, RunState};

use crate::stage_executor::{execute_dev, execute_pm, execute_qa, ExecutorConfig};

/// Everything a single run needs beyond the Issue itself.
pub struct RunInputs<'a> {
    pub backend: &'a dyn ChatBackend,
    pub accountant: &'a TokenAccountant,
    pub fetcher: &'a dyn IssueFetcher,
    pub run_index: &'a RunIndexStore,
    pub output_dir: &'a Utf8Path,
    pub model: &'a str,
    pub temperature: f64,
}

/// Run one issue through `LoadIssue → PM → Dev → QA → Finalize`.
///
/// Always reaches Finalize, even on error: subsequent stages still execute
/// but pass the state through unchanged, and Finalize records a run-index
/// row regardless, with a null verdict and the error string when the run
/// did not succeed. Returns the terminal [`RunState`] for inspection by
/// callers (the JSON-RPC server reports `run_id` and outcome from it).
pub async fn run_pipeline(selector: &IssueSelector, source_file: Option<PathBuf>, inputs: &RunInputs<'_>) -> RunState {
    let run_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let mut state = RunState::new(run_id.clone(), started_at, source_file);

    match inputs.fetcher.fetch(selector).await {
        Ok(issue) => state.set_issue(issue),
        Err(err) => {
            tracing::error!(run_id = %run_id, error = %err, "failed to load issue");
            state.set_error(format!("failed to load issue: {err}"));
        }
    }

    let exec_cfg = ExecutorConfig::new(inputs.backend, inputs.accountant, inputs.model, inputs.temperature);
    let state = execute_pm(state, &exec_cfg).await;
    let state = execute_dev(state, &exec_cfg).await;
    let mut state = execute_qa(state, &exec_cfg).await;

    finalize(&mut state, inputs);
    state
}

/// Finalize's work: compute duration, aggregate tokens, assemble and write
/// the Result on success, index the run either way.
fn finalize(state: &mut RunState, inputs: &RunInputs<'_>) {
    let completed_at = Utc::now();
    let duration_seconds = (completed_at - state.started_at()).num_milliseconds() as f64 / 1000.0;
    let run_tokens = inputs.accountant.aggregate(state.stage_tokens());

    let complete = (!state.has_error())
        .then(|| (state.issue().cloned(), state.pm().cloned(), state.dev().cloned(), state.qa().cloned()))
        .and_then(|(issue, pm, dev, qa)| Some((issue?, pm?, dev?, qa?)));

    if let Some((issue, pm, dev, qa)) = complete {
        let mut implementation_notes = vec![run_tokens.format_summary()];
        implementation_notes.extend(dev.notes.iter().cloned());

        let result = PipelineResult {
            run_id: state.run_id().to_string(),
            timestamp_utc: completed_at,
            issue: issue.clone(),
            pm,
            dev,
            qa: qa.clone(),
            metadata: ResultMetadata {
                run_id: state.run_id().to_string(),
                timestamp_utc: completed_at,
                duration_seconds,
                token_usage: run_tokens,
                implementation_notes,
            },
        };

        let result_filename = match write_result(&result, inputs.output_dir) {
            Ok(filename) => Some(filename),
            Err(err) => {
                tracing::error!(run_id = %state.run_id(), error = %err, "failed to write result file");
                None
            }
        };

        state.set_result(result.clone());

        let row = RunIndexRow {
            run_id: state.run_id().to_string(),
            issue_id: issue.issue_id,
            verdict: Some(qa.verdict),
            started_at: state.started_at(),
            completed_at,
            error: None,
            result_filename: result_filename.clone(),
        };
        index_run(inputs, &row, result_filename, Some(&result));
    } else {
        let issue_id = state.issue().map(|i| i.issue_id.clone()).unwrap_or_else(|| "unknown".to_string());
        let row = RunIndexRow {
            run_id: state.run_id().to_string(),
            issue_id,
            verdict: None,
            started_at: state.started_at(),
            completed_at,
            error: state.error().map(str::to_string),
            result_filename: None,
        };
        index_run(inputs, &row, None, None);
    }

    tracing::info!(
        run_id = %state.run_id(),
        has_error = state.has_error(),
        duration_seconds,
        "run terminated"
    );
}

fn index_run(inputs: &RunInputs<'_>, row: &RunIndexRow, result_filename: Option<String>, result: Option<&PipelineResult>) {
    let result_json = result.map(|r| serde_json::to_string(r).unwrap_or_default());
    if let Err(err) = inputs.run_index.index_run(row, result_json.as_deref()) {
        tracing::error!(run_id = %row.run_id, error = %err, "failed to index run");
    }
    let _ = result_filename;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_issues::IssueSourceError;
    use pipeline_llm::{ChatRequest, ChatResponse, LlmError, PricingTable, ProviderUsage};
    use pipeline_types::{Issue, IssueSource};

    struct StubFetcher(Issue);

    #[async_trait]
    impl IssueFetcher for StubFetcher {
        async fn fetch(&self, _selector: &IssueSelector) -> Result<Issue, IssueSourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl IssueFetcher for FailingFetcher {
        async fn fetch(&self, _selector: &IssueSelector) -> Result<Issue, IssueSourceError> {
            Err(IssueSourceError::MissingFile("no such issue".to_string()))
        }
    }

    struct StubBackend;

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn send(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
            let text = if request.messages.iter().any(|m| m.content.contains("QA stage")) {
                r#"{"verdict":"pass","findings":[],"suggested_changes":[]}"#.to_string()
            } else if request.messages.iter().any(|m| m.content.contains("Developer stage")) {
                r#"{"files":[],"notes":["looks fine"]}"#.to_string()
            } else {
                r#"{"summary":"s","acceptance_criteria":["a"],"plan":["p"],"assumptions":[]}"#.to_string()
            };
            Ok(ChatResponse { text, usage: Some(ProviderUsage { input_tokens: 10, output_tokens: 10 }), model: "anthropic/claude-3-5-haiku-20241022".to_string() })
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn issue() -> Issue {
        Issue::new("x/y#1", "x/y", 1, "t", "", vec![], "https://x", IssueSource::Mock).unwrap()
    }

    #[tokio::test]
    async fn successful_run_writes_result_and_indexes_pass_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = Utf8Path::from_path(dir.path()).unwrap();
        let backend = StubBackend;
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let fetcher = StubFetcher(issue());
        let run_index = RunIndexStore::open(":memory:").unwrap();
        let inputs = RunInputs {
            backend: &backend,
            accountant: &accountant,
            fetcher: &fetcher,
            run_index: &run_index,
            output_dir,
            model: "anthropic/claude-3-5-haiku-20241022",
            temperature: 0.2,
        };

        let state = run_pipeline(&IssueSelector::Mock { filename: "x.json".to_string() }, None, &inputs).await;
        assert!(!state.has_error());
        assert!(state.result().is_some());

        let row = run_index.get_row(state.run_id()).unwrap().unwrap();
        assert_eq!(row.verdict, Some(pipeline_types::Verdict::Pass));
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn issue_load_failure_indexes_error_row_with_no_result() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = Utf8Path::from_path(dir.path()).unwrap();
        let backend = StubBackend;
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let fetcher = FailingFetcher;
        let run_index = RunIndexStore::open(":memory:").unwrap();
        let inputs = RunInputs {
            backend: &backend,
            accountant: &accountant,
            fetcher: &fetcher,
            run_index: &run_index,
            output_dir,
            model: "anthropic/claude-3-5-haiku-20241022",
            temperature: 0.2,
        };

        let state = run_pipeline(&IssueSelector::Mock { filename: "missing.json".to_string() }, None, &inputs).await;
        assert!(state.has_error());
        assert!(state.result().is_none());

        let row = run_index.get_row(state.run_id()).unwrap().unwrap();
        assert!(row.verdict.is_none());
        assert!(row.error.is_some());
    }
}
