//! The collaborators every RPC method shares, handed to the server once at
//! startup and cloned (behind an `Arc`) into each spawned handler task.

use camino::Utf8PathBuf;

use pipeline_issues::IssueFetcher;
use pipeline_llm::{ChatBackend, TokenAccountant};
use pipeline_persistence::RunIndexStore;

pub struct RpcDeps {
    pub fetcher: Box<dyn IssueFetcher>,
    pub backend: Box<dyn ChatBackend>,
    pub accountant: TokenAccountant,
    pub run_index: RunIndexStore,
    pub output_dir: Utf8PathBuf,
    pub ingress_dir: Utf8PathBuf,
    pub mock_dir: Utf8PathBuf,
    pub model: String,
    pub temperature: f64,
}
