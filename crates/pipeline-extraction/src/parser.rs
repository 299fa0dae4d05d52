//! Per-stage schema validation.
//!
//! The three schemas are small, fixed, and known at compile time, so
//! validation is a hand-written decoder over `serde_json::Value` rather than
//! a generic JSON-schema library.

use pipeline_types::{DevOutput, PmOutput, QaOutput};

use crate::extract::extract_json_object;

/// Parse and validate a PM-stage response.
///
/// Returns `None` on any parse or validation failure — the caller
/// (the Stage Executor) substitutes [`PmOutput::fallback`] and records the
/// degradation; this function never constructs a fallback itself.
#[must_use]
pub fn parse_pm(text: &str) -> Option<PmOutput> {
    let object = extract_json_object(text)?;
    let output: PmOutput = serde_json::from_str(&object).ok()?;
    if output.acceptance_criteria.is_empty() || output.plan.is_empty() {
        tracing::debug!("PM output failed schema validation: acceptance_criteria/plan must be non-empty");
        return None;
    }
    Some(output)
}

/// Parse and validate a Dev-stage response. `files` and `notes` may be
/// empty; no additional validation beyond shape is required.
#[must_use]
pub fn parse_dev(text: &str) -> Option<DevOutput> {
    let object = extract_json_object(text)?;
    serde_json::from_str(&object).ok()
}

/// Parse and validate a QA-stage response. `verdict` must be one of the
/// closed set; `serde`'s enum deserialization already rejects anything else.
#[must_use]
pub fn parse_qa(text: &str) -> Option<QaOutput> {
    let object = extract_json_object(text)?;
    serde_json::from_str(&object).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_pm_output() {
        let text = r#"```json
        {"summary":"s","acceptance_criteria":["a"],"plan":["p"],"assumptions":[]}
        ```"#;
        let out = parse_pm(text).unwrap();
        assert_eq!(out.summary, "s");
    }

    #[test]
    fn rejects_pm_output_with_empty_acceptance_criteria() {
        let text = r#"{"summary":"s","acceptance_criteria":[],"plan":["p"],"assumptions":[]}"#;
        assert!(parse_pm(text).is_none());
    }

    #[test]
    fn plain_prose_pm_falls_back_to_none() {
        assert!(parse_pm("I think we should add dark mode.").is_none());
    }

    #[test]
    fn parses_dev_output_with_empty_files() {
        let text = r#"{"files":[],"notes":["nothing to change"]}"#;
        let out = parse_dev(text).unwrap();
        assert!(out.files.is_empty());
    }

    #[test]
    fn parses_qa_output() {
        let text = r#"{"verdict":"pass","findings":[],"suggested_changes":[]}"#;
        let out = parse_qa(text).unwrap();
        assert_eq!(out.verdict, pipeline_types::Verdict::Pass);
    }

    #[test]
    fn rejects_qa_output_with_invalid_verdict() {
        let text = r#"{"verdict":"maybe","findings":[],"suggested_changes":[]}"#;
        assert!(parse_qa(text).is_none());
    }

    #[test]
    fn rejects_dev_output_missing_required_field() {
        let text = r#"{"notes":["x"]}"#;
        assert!(parse_dev(text).is_none());
    }
}
