//! Builds the collaborators every entrypoint (CLI `run`, `watch`, `serve`)
//! shares from a resolved [`pipeline_config::Config`]: the concrete
//! [`ChatBackend`], the [`TokenAccountant`], the [`IssueSourceSet`], and the
//! [`RunIndexStore`]. Kept separate from `cli.rs` so each subcommand wires
//! only what it needs rather than repeating construction inline.

use pipeline_config::Config;
use pipeline_issues::IssueSourceSet;
use pipeline_llm::{AnthropicBackend, AzureBackend, ChatBackend, OpenAiBackend, PricingTable, TokenAccountant};
use pipeline_persistence::RunIndexStore;

/// The shared, long-lived collaborators a run of the pipeline needs beyond
/// the issue itself — one instance per process, not per run.
pub struct Collaborators {
    pub backend: Box<dyn ChatBackend>,
    pub accountant: TokenAccountant,
    pub fetcher: IssueSourceSet,
    pub run_index: RunIndexStore,
}

impl Collaborators {
    /// Construct every collaborator from a resolved configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the run index store cannot be opened at
    /// `config.run_index_path`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = build_backend(config);
        let accountant = TokenAccountant::new(PricingTable::default(), config.nominal_context_window);
        let fetcher = IssueSourceSet::new(
            config.mock_dir.clone().into_std_path_buf(),
            config.remote_base_url.clone(),
            config.remote_api_token.clone(),
        );
        let run_index = RunIndexStore::open(config.run_index_path.as_str())
            .map_err(|e| anyhow::anyhow!("failed to open run index at {}: {e}", config.run_index_path))?;

        Ok(Self { backend, accountant, fetcher, run_index })
    }
}

/// Construct the concrete [`ChatBackend`] for `config.provider`.
///
/// `provider_api_key` is guaranteed present here: [`Config::from_env`]
/// validates it at resolution time for every provider (spec.md §4.9).
fn build_backend(config: &Config) -> Box<dyn ChatBackend> {
    let api_key = config.provider_api_key.clone().unwrap_or_default();
    match config.provider {
        pipeline_config::Provider::Anthropic => Box::new(AnthropicBackend::new(api_key, config.chat_base_url.clone())),
        pipeline_config::Provider::Openai => Box::new(OpenAiBackend::new(api_key, config.chat_base_url.clone())),
        pipeline_config::Provider::Azure => {
            let endpoint = config.provider_endpoint.clone().unwrap_or_default();
            let deployment = config.provider_deployment.clone().unwrap_or_default();
            Box::new(AzureBackend::new(api_key, &endpoint, &deployment))
        }
    }
}
