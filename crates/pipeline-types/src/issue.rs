//! The canonical [`Issue`] record: the pipeline's sole input shape.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Where an [`Issue`] was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    Mock,
    Remote,
    File,
    Manual,
}

impl std::fmt::Display for IssueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Remote => write!(f, "remote"),
            Self::File => write!(f, "file"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A structured work item describing a software change request.
///
/// Immutable after construction. Use [`Issue::new`] (or [`Issue::from_json`]
/// for externally-sourced bytes) rather than building the struct literal
/// directly, since both enforce the invariants documented on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Issue {
    pub issue_id: String,
    pub repo: String,
    pub issue_number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
    pub source: IssueSource,
}

impl Issue {
    /// Construct an `Issue`, validating and normalizing in one step.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if any required field is
    /// empty after trimming, or if `issue_number` is zero.
    pub fn new(
        issue_id: impl Into<String>,
        repo: impl Into<String>,
        issue_number: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        labels: Vec<String>,
        url: impl Into<String>,
        source: IssueSource,
    ) -> Result<Self, PipelineError> {
        let issue_id = issue_id.into();
        let repo = repo.into();
        let title = title.into();
        let url = url.into();

        require_non_empty("issue_id", &issue_id)?;
        require_non_empty("repo", &repo)?;
        require_non_empty("title", &title)?;
        require_non_empty("url", &url)?;
        if issue_number < 1 {
            return Err(PipelineError::InvalidInput(
                "issue_number must be >= 1".to_string(),
            ));
        }

        Ok(Self {
            issue_id,
            repo,
            issue_number,
            title,
            body: body.into(),
            labels: dedupe_labels(labels),
            url,
            source,
        })
    }

    /// Parse and validate an `Issue` from raw JSON bytes.
    ///
    /// Unknown fields are rejected (`#[serde(deny_unknown_fields)]`); every
    /// required field is then re-validated via [`Issue::new`]'s rules so
    /// that an externally-sourced record cannot smuggle in blank strings.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PipelineError> {
        let raw: Issue = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::InvalidInput(format!("malformed issue json: {e}")))?;
        Issue::new(
            raw.issue_id,
            raw.repo,
            raw.issue_number,
            raw.title,
            raw.body,
            raw.labels,
            raw.url,
            raw.source,
        )
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), PipelineError> {
    if value.trim().is_empty() {
        return Err(PipelineError::InvalidInput(format!(
            "{field} must be non-empty"
        )));
    }
    Ok(())
}

/// Labels are an unordered set; dedupe while keeping first-seen order so
/// re-serialization is stable for tests that compare JSON text.
fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels.into_iter().filter(|l| seen.insert(l.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Issue {
        Issue::new(
            "acme/widget#101",
            "acme/widget",
            101,
            "Add dark mode",
            "",
            vec!["ui".to_string(), "ui".to_string()],
            "https://example.com/issues/101",
            IssueSource::Mock,
        )
        .unwrap()
    }

    #[test]
    fn dedupes_labels() {
        let issue = sample();
        assert_eq!(issue.labels, vec!["ui".to_string()]);
    }

    #[test]
    fn rejects_empty_title() {
        let err = Issue::new(
            "x/y#1", "x/y", 1, "   ", "", vec![], "https://x", IssueSource::Manual,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_issue_number() {
        let err = Issue::new(
            "x/y#0", "x/y", 0, "t", "", vec![], "https://x", IssueSource::Manual,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn round_trips_through_json_modulo_label_order() {
        let issue = sample();
        let json = serde_json::to_vec(&issue).unwrap();
        let parsed = Issue::from_json(&json).unwrap();
        assert_eq!(issue, parsed);
    }

    #[test]
    fn rejects_unknown_fields() {
        let bad = br#"{"issue_id":"x/y#1","repo":"x/y","issue_number":1,"title":"t","url":"https://x","source":"manual","extra":true}"#;
        assert!(Issue::from_json(bad).is_err());
    }

    #[test]
    fn defaults_body_and_labels() {
        let minimal = br#"{"issue_id":"x/y#1","repo":"x/y","issue_number":1,"title":"t","url":"https://x","source":"manual"}"#;
        let issue = Issue::from_json(minimal).unwrap();
        assert_eq!(issue.body, "");
        assert!(issue.labels.is_empty());
    }
}
