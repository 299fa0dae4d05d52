//! The five exposed JSON-RPC methods (spec.md §4.8).

use async_trait::async_trait;
use serde_json::{json, Value};

use pipeline_engine::{run_pipeline, RunInputs};
use pipeline_issues::{IssueFetcher, IssueSelector, IssueSourceError};
use pipeline_types::{ErrorKind, Issue, PipelineError, RunState};

use crate::deps::RpcDeps;
use crate::error::RpcError;
use crate::params::{optional_bool, parse_and_validate_issue, require_str, require_u64};
use crate::progress::ProgressSink;

pub async fn list_mock_issues(deps: &RpcDeps) -> Result<Value, RpcError> {
    let read_dir = std::fs::read_dir(&deps.mock_dir)
        .map_err(|e| RpcError::new(ErrorKind::NotFound, format!("mock directory {}: {e}", deps.mock_dir)))?;

    let mut issues = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else { continue };
        let bytes = std::fs::read(&path).map_err(|e| RpcError::new(ErrorKind::InvalidInput, e.to_string()))?;
        let issue = Issue::from_json(&bytes)?;
        let priority = issue
            .labels
            .iter()
            .find_map(|l| l.strip_prefix("priority:"))
            .unwrap_or("normal");
        issues.push(json!({
            "filename": filename,
            "title": issue.title,
            "priority": priority,
            "path": path.display().to_string(),
        }));
    }

    let count = issues.len();
    Ok(json!({"status": "success", "issues": issues, "count": count}))
}

pub async fn load_mock_issue(params: &Value, deps: &RpcDeps) -> Result<Value, RpcError> {
    let filename = require_str(params, "filename")?.to_string();
    let issue = deps
        .fetcher
        .fetch(&IssueSelector::Mock { filename })
        .await
        .map_err(PipelineError::from)?;
    Ok(json!({"status": "success", "issue": issue}))
}

pub async fn fetch_remote_issue(params: &Value, deps: &RpcDeps) -> Result<Value, RpcError> {
    let owner = require_str(params, "owner")?.to_string();
    let repo = require_str(params, "repo")?.to_string();
    let number = require_u64(params, "number")?;
    let save_to_ingress = optional_bool(params, "save_to_ingress", false);

    let issue = deps
        .fetcher
        .fetch(&IssueSelector::Remote { owner, repo, number })
        .await
        .map_err(PipelineError::from)?;

    let mut response = json!({"status": "success", "issue": issue});
    if save_to_ingress {
        let filename = format!("{}.json", issue.issue_id.replace(['/', '#'], "_"));
        let destination = deps.ingress_dir.join(&filename);
        let bytes = serde_json::to_vec_pretty(&issue).map_err(|e| RpcError::new(ErrorKind::InvalidInput, e.to_string()))?;
        std::fs::create_dir_all(&deps.ingress_dir).map_err(|e| RpcError::new(ErrorKind::PersistenceFailed, e.to_string()))?;
        std::fs::write(&destination, bytes).map_err(|e| RpcError::new(ErrorKind::PersistenceFailed, e.to_string()))?;
        response["saved_to"] = json!(destination.to_string());
        tracing::info!(path = %destination, "saved fetched issue to ingress");
    }

    Ok(response)
}

pub async fn run_pipeline_method(params: &Value, deps: &RpcDeps, progress: &ProgressSink) -> Result<Value, RpcError> {
    let issue_value = params
        .get("issue")
        .ok_or_else(|| RpcError::new(ErrorKind::InvalidInput, "missing field `issue`"))?;
    let issue = parse_and_validate_issue(issue_value).map_err(RpcError::from)?;

    progress.emit(0.1, "running");

    let fetcher = LiteralFetcher(issue);
    let inputs = RunInputs {
        backend: deps.backend.as_ref(),
        accountant: &deps.accountant,
        fetcher: &fetcher,
        run_index: &deps.run_index,
        output_dir: deps.output_dir.as_path(),
        model: &deps.model,
        temperature: deps.temperature,
    };
    let selector = IssueSelector::Mock { filename: "rpc-inline".to_string() };
    let state = run_pipeline(&selector, None, &inputs).await;

    run_outcome_to_value(&state, deps)
}

pub async fn process_file(params: &Value, deps: &RpcDeps, progress: &ProgressSink) -> Result<Value, RpcError> {
    let path = require_str(params, "path")?.to_string();
    progress.emit(0.1, "loading");

    let inputs = RunInputs {
        backend: deps.backend.as_ref(),
        accountant: &deps.accountant,
        fetcher: deps.fetcher.as_ref(),
        run_index: &deps.run_index,
        output_dir: deps.output_dir.as_path(),
        model: &deps.model,
        temperature: deps.temperature,
    };
    let selector = IssueSelector::File { path: path.clone().into() };
    progress.emit(0.2, "running");
    let state = run_pipeline(&selector, Some(path.into()), &inputs).await;

    run_outcome_to_value(&state, deps)
}

/// Both `run_pipeline` and `process_file` share the same response shape
/// (spec.md §4.8's table): `run_id`, `token_usage`, `output_file`, and a
/// human-readable `report`, plus `process_file`'s extra `verdict` field.
///
/// `state.error()` is already a fully-formatted message (the Stage Executor
/// or Issue Source Set's own `Display` text); it is reported verbatim rather
/// than re-wrapped in a fabricated `PipelineError` variant, which would
/// double up the "stage X failed" wording. The kind is always `stage_failed`
/// here since Issue Source failures never reach Finalize (spec.md §7:
/// "Issue Source errors propagate immediately to the caller; no run is
/// started").
fn run_outcome_to_value(state: &RunState, deps: &RpcDeps) -> Result<Value, RpcError> {
    if state.has_error() {
        return Err(RpcError::new(
            ErrorKind::StageFailed,
            state.error().unwrap_or("run terminated with an unrecorded error"),
        ));
    }

    let Some(result) = state.result() else {
        return Err(RpcError::new(ErrorKind::PersistenceFailed, "run completed without a result"));
    };

    let row = deps
        .run_index
        .get_row(state.run_id())
        .map_err(|e| RpcError::new(ErrorKind::PersistenceFailed, e.to_string()))?;
    let output_file = row.and_then(|r| r.result_filename);

    let report = format!(
        "{}\n\nQA verdict: {}\nFindings: {}",
        result.metadata.implementation_notes.join("\n"),
        result.qa.verdict,
        if result.qa.findings.is_empty() { "none".to_string() } else { result.qa.findings.join("; ") },
    );

    Ok(json!({
        "status": "success",
        "run_id": state.run_id(),
        "verdict": result.qa.verdict,
        "stages": {
            "pm": result.pm,
            "dev": result.dev,
            "qa": result.qa,
        },
        "output_file": output_file,
        "token_usage": result.metadata.token_usage,
        "report": report,
    }))
}

/// Hands a single, already-materialized [`Issue`] to the state machine as
/// though it had been fetched — used for the `run_pipeline` RPC method,
/// whose params embed the issue directly rather than a selector
/// (spec.md §4.8's table: `{issue}`, not `{selector}`).
struct LiteralFetcher(Issue);

#[async_trait]
impl IssueFetcher for LiteralFetcher {
    async fn fetch(&self, _selector: &IssueSelector) -> Result<Issue, IssueSourceError> {
        Ok(self.0.clone())
    }
}
