//! The uniform `Fetch(selector) → Issue` contract.

use async_trait::async_trait;

use pipeline_types::Issue;

use crate::error::IssueSourceError;
use crate::selector::IssueSelector;

/// Loads an [`Issue`] from one of {mock file, arbitrary file path, remote
/// issue-tracker HTTP endpoint}, normalizing to the canonical schema.
#[async_trait]
pub trait IssueFetcher: Send + Sync {
    async fn fetch(&self, selector: &IssueSelector) -> Result<Issue, IssueSourceError>;
}
