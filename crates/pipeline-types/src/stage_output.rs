//! The three [`StageOutput`][crate] variants and the stage identifier.

use serde::{Deserialize, Serialize};

/// One of the three reasoning stages an issue passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "Dev")]
    Dev,
    #[serde(rename = "QA")]
    Qa,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pm => write!(f, "PM"),
            Self::Dev => write!(f, "Dev"),
            Self::Qa => write!(f, "QA"),
        }
    }
}

/// Output of the Product Manager stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmOutput {
    pub summary: String,
    pub acceptance_criteria: Vec<String>,
    pub plan: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

/// A single file artifact produced by the Developer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileArtifact {
    pub path: String,
    pub content: String,
    pub language: String,
}

/// Output of the Developer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevOutput {
    pub files: Vec<FileArtifact>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// The QA stage's terminal judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Pass,
    Fail,
    NeedsHuman,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::NeedsHuman => write!(f, "needs-human"),
        }
    }
}

/// Output of the Quality Assurance stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaOutput {
    pub verdict: Verdict,
    pub findings: Vec<String>,
    pub suggested_changes: Vec<String>,
}

impl PmOutput {
    /// The fallback record constructed for an unparsable PM response.
    #[must_use]
    pub fn fallback(raw_response: &str) -> Self {
        Self {
            summary: truncate(raw_response, 500),
            acceptance_criteria: vec!["Review output manually".to_string()],
            plan: vec!["Re-run or refine prompts".to_string()],
            assumptions: vec![crate::DEGRADED_OUTPUT_SENTINEL.to_string()],
        }
    }
}

impl DevOutput {
    /// The documented fallback record for an unparsable Dev response.
    #[must_use]
    pub fn fallback(raw_response: &str) -> Self {
        Self {
            files: Vec::new(),
            notes: vec![truncate(raw_response, 500), crate::DEGRADED_OUTPUT_SENTINEL.to_string()],
        }
    }
}

impl QaOutput {
    /// The documented fallback record for an unparsable QA response.
    #[must_use]
    pub fn fallback(raw_response: &str) -> Self {
        Self {
            verdict: Verdict::NeedsHuman,
            findings: vec![truncate(raw_response, 500)],
            suggested_changes: vec![crate::DEGRADED_OUTPUT_SENTINEL.to_string()],
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pm_fallback_carries_sentinel() {
        let out = PmOutput::fallback("I think we should add dark mode.");
        assert!(out.summary.starts_with("I think we should add dark mode."));
        assert_eq!(out.assumptions, vec![crate::DEGRADED_OUTPUT_SENTINEL.to_string()]);
    }

    #[test]
    fn dev_fallback_has_no_files() {
        let out = DevOutput::fallback("prose");
        assert!(out.files.is_empty());
        assert!(out.notes.contains(&crate::DEGRADED_OUTPUT_SENTINEL.to_string()));
    }

    #[test]
    fn qa_fallback_needs_human() {
        let out = QaOutput::fallback("prose");
        assert_eq!(out.verdict, Verdict::NeedsHuman);
    }

    #[test]
    fn truncate_respects_char_boundary_not_byte_count() {
        let long = "x".repeat(600);
        let out = PmOutput::fallback(&long);
        assert_eq!(out.summary.chars().count(), 500);
    }

    #[test]
    fn verdict_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&Verdict::NeedsHuman).unwrap(), "\"needs-human\"");
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"pass\"");
    }

    #[test]
    fn stage_name_serializes_declared_case() {
        assert_eq!(serde_json::to_string(&StageName::Pm).unwrap(), "\"PM\"");
        assert_eq!(serde_json::to_string(&StageName::Qa).unwrap(), "\"QA\"");
    }
}
