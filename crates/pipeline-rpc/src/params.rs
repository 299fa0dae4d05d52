//! Small helpers for pulling required fields out of a method's `params`
//! object, converting absence/type-mismatch into `PipelineError::InvalidInput`
//! rather than a protocol-level error — spec.md §4.8 only distinguishes
//! `status: success | error` per method, not per malformed field.

use serde_json::Value;

use pipeline_types::{Issue, PipelineError};

pub fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, PipelineError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::InvalidInput(format!("missing or non-string field `{field}`")))
}

pub fn require_u64(params: &Value, field: &str) -> Result<u64, PipelineError> {
    params
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| PipelineError::InvalidInput(format!("missing or non-numeric field `{field}`")))
}

pub fn optional_bool(params: &Value, field: &str, default: bool) -> bool {
    params.get(field).and_then(Value::as_bool).unwrap_or(default)
}

pub fn require_object<'a>(params: &'a Value, field: &str) -> Result<&'a Value, PipelineError> {
    let value = params
        .get(field)
        .ok_or_else(|| PipelineError::InvalidInput(format!("missing field `{field}`")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(PipelineError::InvalidInput(format!("field `{field}` must be an object")))
    }
}

/// Parse an `issue` parameter and re-validate it through [`Issue::from_json`]
/// rather than a bare `serde_json::from_value`, which only runs the derived
/// `Deserialize` and skips `Issue::new`'s invariant checks (non-empty fields,
/// `issue_number >= 1`). A caller-supplied issue that fails those invariants
/// must surface as `invalid_input` before anything touches persistence.
pub fn parse_and_validate_issue(issue_value: &Value) -> Result<Issue, PipelineError> {
    let bytes = serde_json::to_vec(issue_value)
        .map_err(|e| PipelineError::InvalidInput(format!("malformed issue: {e}")))?;
    Issue::from_json(&bytes)
}
