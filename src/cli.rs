//! Command-line interface for agent-pipeline.
//!
//! Three subcommands, all sharing the same configuration resolution and
//! collaborator wiring: `run` (one-shot pipeline invocation over a single
//! issue), `watch` (the folder watcher front-end), and `serve` (the
//! JSON-RPC tool server over stdio).

use std::time::Duration;

use clap::{Parser, Subcommand};

use pipeline_config::Config;
use pipeline_engine::{run_pipeline, RunInputs};
use pipeline_issues::{IssueFetcher, IssueSelector, IssueSourceError};
use pipeline_types::{exit_codes, ErrorKind, Issue, PipelineError};
use pipeline_watcher::{FolderWatcher, WatcherConfig, WatcherDeps};

use crate::wiring::Collaborators;

/// agent-pipeline — a multi-stage agent pipeline orchestrator.
#[derive(Parser)]
#[command(name = "agent-pipeline")]
#[command(about = "Routes issues through PM -> Dev -> QA stages with a durable, audit-ready record of each run")]
#[command(long_about = r#"
agent-pipeline runs a structured work item through three LLM-backed reasoning
stages (Product Manager, Developer, QA) and writes a durable Result artifact
plus a relational run-index row for every terminated run.

EXAMPLES:
  # Run a single mock fixture through the pipeline
  agent-pipeline run --issue mock:dark-mode.json

  # Run an arbitrary issue file
  agent-pipeline run --issue file:./issue.json

  # Run a remote issue-tracker issue
  agent-pipeline run --issue remote:acme/widget#101

  # Watch the configured ingress directory for new issues
  agent-pipeline watch

  # Serve the JSON-RPC tool surface over stdio
  agent-pipeline serve

CONFIGURATION:
  Configuration is resolved once from the environment, all options named
  PIPELINE_<FIELD> (e.g. PIPELINE_PROVIDER, PIPELINE_MODEL, PIPELINE_INGRESS_DIR).
"#)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single issue through the pipeline once and exit.
    Run {
        /// Issue selector: `mock:<filename>`, `file:<path>`, or `remote:<owner>/<repo>#<number>`.
        #[arg(long)]
        issue: String,
    },
    /// Poll the configured ingress directory, running the pipeline on each
    /// newly-arrived, fully-written issue file.
    Watch,
    /// Serve the JSON-RPC tool surface over stdio.
    Serve {
        /// Maximum number of requests handled concurrently.
        #[arg(long, default_value_t = pipeline_rpc::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

/// Parse, dispatch, and run to completion. Returns the process exit code
/// (spec.md §6); never panics on a user-facing error path.
#[must_use]
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap's own Display already includes usage; this is the one
            // path where anything gets printed before configuration exists.
            let _ = err.print();
            return exit_codes::INVALID_INPUT;
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return exit_codes::INVALID_INPUT;
        }
    };

    pipeline_config::init_logging(config.log_level);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return exit_codes::PERSISTENCE_FAILED;
        }
    };

    runtime.block_on(dispatch(cli.command, config))
}

async fn dispatch(command: Command, config: Config) -> i32 {
    let collaborators = match Collaborators::from_config(&config) {
        Ok(collaborators) => collaborators,
        Err(err) => {
            eprintln!("failed to initialize: {err}");
            return exit_codes::PERSISTENCE_FAILED;
        }
    };

    match command {
        Command::Run { issue } => run_once(&issue, &config, collaborators).await,
        Command::Watch => watch(&config, collaborators).await,
        Command::Serve { concurrency } => serve(&config, collaborators, concurrency).await,
    }
}

/// Parse a `mock:`/`file:`/`remote:` selector string into an
/// [`IssueSelector`] (new CLI surface; spec.md §6 treats "CLI mode" as a
/// consumer without specifying flags).
fn parse_selector(raw: &str) -> Result<IssueSelector, PipelineError> {
    let (kind, rest) = raw
        .split_once(':')
        .ok_or_else(|| PipelineError::InvalidInput(format!("selector must be `kind:value`, got `{raw}`")))?;

    match kind {
        "mock" => Ok(IssueSelector::Mock { filename: rest.to_string() }),
        "file" => Ok(IssueSelector::File { path: rest.into() }),
        "remote" => {
            let (owner_repo, number) = rest
                .split_once('#')
                .ok_or_else(|| PipelineError::InvalidInput(format!("remote selector must be `owner/repo#number`, got `{rest}`")))?;
            let (owner, repo) = owner_repo
                .split_once('/')
                .ok_or_else(|| PipelineError::InvalidInput(format!("remote selector must be `owner/repo#number`, got `{rest}`")))?;
            let number: u64 = number
                .parse()
                .map_err(|_| PipelineError::InvalidInput(format!("remote issue number must be an integer, got `{number}`")))?;
            Ok(IssueSelector::Remote { owner: owner.to_string(), repo: repo.to_string(), number })
        }
        other => Err(PipelineError::InvalidInput(format!("unknown selector kind `{other}`, expected mock/file/remote"))),
    }
}

/// Hands a single, already-fetched [`Issue`] to the state machine, matching
/// the JSON-RPC `run_pipeline` method's shape (`pipeline-rpc::methods`).
struct LiteralFetcher(Issue);

#[async_trait::async_trait]
impl IssueFetcher for LiteralFetcher {
    async fn fetch(&self, _selector: &IssueSelector) -> Result<Issue, IssueSourceError> {
        Ok(self.0.clone())
    }
}

async fn run_once(raw_selector: &str, config: &Config, collaborators: Collaborators) -> i32 {
    let selector = match parse_selector(raw_selector) {
        Ok(selector) => selector,
        Err(err) => {
            eprintln!("invalid issue selector: {err}");
            return exit_codes::INVALID_INPUT;
        }
    };

    // Issue Source errors propagate immediately to the caller; no run is
    // started (spec.md §7).
    let issue = match collaborators.fetcher.fetch(&selector).await {
        Ok(issue) => issue,
        Err(err) => {
            let pipeline_err = PipelineError::from(err);
            eprintln!("failed to load issue: {pipeline_err}");
            return exit_codes::for_kind(pipeline_err.kind());
        }
    };

    let fetcher = LiteralFetcher(issue);
    let inputs = RunInputs {
        backend: collaborators.backend.as_ref(),
        accountant: &collaborators.accountant,
        fetcher: &fetcher,
        run_index: &collaborators.run_index,
        output_dir: config.output_dir.as_path(),
        model: &config.model,
        temperature: config.temperature,
    };

    let state = run_pipeline(&selector, None, &inputs).await;

    if state.has_error() {
        eprintln!("run {} terminated with an error: {}", state.run_id(), state.error().unwrap_or("unknown"));
        return exit_codes::for_kind(ErrorKind::StageFailed);
    }

    let Some(result) = state.result() else {
        eprintln!("run {} completed without an error but produced no result", state.run_id());
        return exit_codes::PERSISTENCE_FAILED;
    };

    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to render result as JSON: {err}"),
    }
    exit_codes::SUCCESS
}

async fn watch(config: &Config, collaborators: Collaborators) -> i32 {
    let mut watcher_config = WatcherConfig::new(config.ingress_dir.clone(), config.processed_dir.clone(), config.poisoned_dir.clone());
    watcher_config.poll_interval = Duration::from_millis(config.watcher_poll_interval_ms);
    watcher_config.quiet_interval = Duration::from_millis(config.watcher_quiet_interval_ms);
    watcher_config.workers = config.watcher_workers;

    let deps = WatcherDeps {
        backend: collaborators.backend.as_ref(),
        accountant: &collaborators.accountant,
        fetcher: &collaborators.fetcher,
        run_index: &collaborators.run_index,
        output_dir: config.output_dir.as_path(),
        model: &config.model,
        temperature: config.temperature,
    };

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining in-flight watcher work");
        let _ = cancel_tx.send(true);
    });

    let mut watcher = FolderWatcher::new(watcher_config);
    match watcher.run(&deps, cancel_rx).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            eprintln!("folder watcher exited with an error: {err}");
            exit_codes::PERSISTENCE_FAILED
        }
    }
}

async fn serve(config: &Config, collaborators: Collaborators, concurrency: usize) -> i32 {
    let deps = pipeline_rpc::RpcDeps {
        fetcher: Box::new(collaborators.fetcher),
        backend: collaborators.backend,
        accountant: collaborators.accountant,
        run_index: collaborators.run_index,
        output_dir: config.output_dir.clone(),
        ingress_dir: config.ingress_dir.clone(),
        mock_dir: config.mock_dir.clone(),
        model: config.model.clone(),
        temperature: config.temperature,
    };

    let server = pipeline_rpc::Server::new(deps, concurrency);
    server.serve(tokio::io::stdin(), tokio::io::stdout()).await;
    exit_codes::SUCCESS
}
