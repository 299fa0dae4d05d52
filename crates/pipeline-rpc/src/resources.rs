//! Read-only resources and the one parameterized prompt template
//! (spec.md §4.8: "the server may expose read-only named resources... and
//! parameterized prompt templates... These are pure data and require no
//! state machine logic"), grounded on the resource/tool split in
//! `decision-gate-mcp` — a read-only surface with no orchestration logic of
//! its own.

use serde_json::{json, Value};

use pipeline_engine::prompts;
use pipeline_types::{ErrorKind, PmOutput, DevOutput};

use crate::deps::RpcDeps;
use crate::error::RpcError;
use crate::params::{require_object, require_str};

#[must_use]
pub fn list_resources() -> Value {
    json!({
        "status": "success",
        "resources": [
            {"uri": "config://snapshot", "description": "redacted runtime configuration"},
            {"uri": "schema://issue", "description": "the Issue JSON schema"},
        ],
    })
}

pub fn read_resource(params: &Value, deps: &RpcDeps) -> Result<Value, RpcError> {
    let uri = require_str(params, "uri")?;
    match uri {
        "config://snapshot" => Ok(json!({
            "status": "success",
            "contents": {
                "model": deps.model,
                "temperature": deps.temperature,
                "output_dir": deps.output_dir.to_string(),
                "ingress_dir": deps.ingress_dir.to_string(),
                "mock_dir": deps.mock_dir.to_string(),
            },
        })),
        "schema://issue" => Ok(json!({"status": "success", "contents": issue_schema()})),
        other => Err(RpcError::new(ErrorKind::NotFound, format!("no such resource: {other}"))),
    }
}

fn issue_schema() -> Value {
    json!({
        "type": "object",
        "required": ["issue_id", "repo", "issue_number", "title", "url", "source"],
        "properties": {
            "issue_id": {"type": "string"},
            "repo": {"type": "string"},
            "issue_number": {"type": "integer", "minimum": 1},
            "title": {"type": "string"},
            "body": {"type": "string", "default": ""},
            "labels": {"type": "array", "items": {"type": "string"}, "default": []},
            "url": {"type": "string"},
            "source": {"type": "string", "enum": ["mock", "remote", "file", "manual"]},
        },
    })
}

/// Returns the composed prompt string the Stage Executor would actually
/// send for `stage`, given the same inputs — useful for callers iterating
/// on prompt wording without invoking a chat endpoint.
pub fn stage_prompt(params: &Value) -> Result<Value, RpcError> {
    let stage = require_str(params, "stage")?;
    let issue_value = require_object(params, "issue")?;
    let issue = crate::params::parse_and_validate_issue(issue_value).map_err(RpcError::from)?;

    let (system, user) = match stage {
        "pm" => (prompts::pm_system(), prompts::pm_user(&issue)),
        "dev" => {
            let pm: PmOutput = serde_json::from_value(require_object(params, "pm")?.clone())
                .map_err(|e| RpcError::new(ErrorKind::InvalidInput, format!("malformed pm output: {e}")))?;
            (prompts::dev_system(), prompts::dev_user(&issue, &pm))
        }
        "qa" => {
            let pm: PmOutput = serde_json::from_value(require_object(params, "pm")?.clone())
                .map_err(|e| RpcError::new(ErrorKind::InvalidInput, format!("malformed pm output: {e}")))?;
            let dev: DevOutput = serde_json::from_value(require_object(params, "dev")?.clone())
                .map_err(|e| RpcError::new(ErrorKind::InvalidInput, format!("malformed dev output: {e}")))?;
            (prompts::qa_system(), prompts::qa_user(&issue, &pm, &dev))
        }
        other => return Err(RpcError::new(ErrorKind::InvalidInput, format!("unknown stage: {other}"))),
    };

    Ok(json!({"status": "success", "system": system, "user": user}))
}
