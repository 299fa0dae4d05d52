//! The concrete [`IssueSourceSet`]: mock/file/remote behind one interface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use pipeline_types::{Issue, IssueSource as IssueOrigin};

use crate::error::IssueSourceError;
use crate::fetcher::IssueFetcher;
use crate::selector::IssueSelector;

/// Reads mock/file issues from disk and remote issues from an issue-tracker
/// HTTP API, normalizing all three to the canonical [`Issue`] schema.
pub struct IssueSourceSet {
    mock_dir: PathBuf,
    http: reqwest::Client,
    remote_base_url: String,
    remote_api_token: Option<String>,
}

impl IssueSourceSet {
    #[must_use]
    pub fn new(mock_dir: PathBuf, remote_base_url: impl Into<String>, remote_api_token: Option<String>) -> Self {
        Self {
            mock_dir,
            http: reqwest::Client::new(),
            remote_base_url: remote_base_url.into(),
            remote_api_token,
        }
    }

    /// The directory `Mock` selectors resolve against, for callers that need
    /// to enumerate available fixtures (e.g. the JSON-RPC `list_mock_issues`
    /// method).
    #[must_use]
    pub fn mock_dir(&self) -> &Path {
        &self.mock_dir
    }

    /// Reads and validates an issue file, distinguishing JSON that doesn't
    /// parse at all (`MalformedJson`) from JSON that parses but fails
    /// `Issue::new`'s invariants (`SchemaViolation`).
    fn read_issue_file(path: &Path) -> Result<Issue, IssueSourceError> {
        let bytes = std::fs::read(path)
            .map_err(|_| IssueSourceError::MissingFile(path.display().to_string()))?;
        let raw: Issue = serde_json::from_slice(&bytes)
            .map_err(|e| IssueSourceError::MalformedJson(e.to_string()))?;
        Issue::new(raw.issue_id, raw.repo, raw.issue_number, raw.title, raw.body, raw.labels, raw.url, raw.source)
            .map_err(|e| IssueSourceError::SchemaViolation(e.to_string()))
    }

    async fn fetch_remote(&self, owner: &str, repo: &str, number: u64) -> Result<Issue, IssueSourceError> {
        let token = self
            .remote_api_token
            .as_ref()
            .ok_or_else(|| IssueSourceError::MissingCredential("remote_api_token not configured".to_string()))?;

        let url = format!("{}/repos/{owner}/{repo}/issues/{number}", self.remote_base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IssueSourceError::HttpNonSuccess { status: 0, body: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IssueSourceError::HttpNonSuccess { status, body });
        }

        let body: RemoteIssuePayload = response
            .json()
            .await
            .map_err(|e| IssueSourceError::HttpBodyUnparseable(e.to_string()))?;

        Issue::new(
            format!("{owner}/{repo}#{number}"),
            format!("{owner}/{repo}"),
            number,
            body.title,
            body.body.unwrap_or_default(),
            body.labels.into_iter().map(|l| l.name).collect(),
            body.html_url,
            IssueOrigin::Remote,
        )
        .map_err(|e| IssueSourceError::SchemaViolation(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RemoteLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RemoteIssuePayload {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RemoteLabel>,
    html_url: String,
}

#[async_trait]
impl IssueFetcher for IssueSourceSet {
    async fn fetch(&self, selector: &IssueSelector) -> Result<Issue, IssueSourceError> {
        match selector {
            IssueSelector::Mock { filename } => Self::read_issue_file(&self.mock_dir.join(filename)),
            IssueSelector::File { path } => Self::read_issue_file(path),
            IssueSelector::Remote { owner, repo, number } => self.fetch_remote(owner, repo, *number).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_set(dir: &Path) -> IssueSourceSet {
        IssueSourceSet::new(dir.to_path_buf(), "https://api.example.com", None)
    }

    #[tokio::test]
    async fn loads_a_well_formed_mock_issue() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("dark-mode.json")).unwrap();
        write!(
            file,
            r#"{{"issue_id":"acme/widget#101","repo":"acme/widget","issue_number":101,"title":"Add dark mode","body":"","labels":["ui"],"url":"https://example.com/101","source":"mock"}}"#
        )
        .unwrap();

        let issue = source_set(dir.path())
            .fetch(&IssueSelector::Mock { filename: "dark-mode.json".to_string() })
            .await
            .unwrap();
        assert_eq!(issue.issue_id, "acme/widget#101");
        assert_eq!(issue.labels, vec!["ui".to_string()]);
    }

    #[tokio::test]
    async fn missing_mock_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = source_set(dir.path())
            .fetch(&IssueSelector::Mock { filename: "absent.json".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, IssueSourceError::MissingFile(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_distinct_from_schema_violation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"not json at all").unwrap();
        let err = source_set(dir.path())
            .fetch(&IssueSelector::Mock { filename: "bad.json".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, IssueSourceError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn well_formed_json_failing_invariants_is_schema_violation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("blank-title.json"),
            br#"{"issue_id":"x/y#1","repo":"x/y","issue_number":1,"title":"   ","url":"https://x","source":"mock"}"#,
        )
        .unwrap();
        let err = source_set(dir.path())
            .fetch(&IssueSelector::Mock { filename: "blank-title.json".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, IssueSourceError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn remote_without_token_is_missing_credential() {
        let dir = tempfile::tempdir().unwrap();
        let err = source_set(dir.path())
            .fetch(&IssueSelector::Remote { owner: "acme".to_string(), repo: "widget".to_string(), number: 101 })
            .await
            .unwrap_err();
        assert!(matches!(err, IssueSourceError::MissingCredential(_)));
    }
}
