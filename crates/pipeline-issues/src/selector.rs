//! The tagged-union selector passed to [`crate::IssueFetcher::fetch`].

use std::path::PathBuf;

/// Which issue to load and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueSelector {
    /// A named fixture under the conventional mock directory.
    Mock { filename: String },
    /// An arbitrary JSON file path.
    File { path: PathBuf },
    /// A remote issue-tracker lookup.
    Remote { owner: String, repo: String, number: u64 },
}
