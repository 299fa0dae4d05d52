//! Configuration & Logging: resolved once at process start from an
//! environment-variable store, then treated as a read-only snapshot. Each
//! recognized option is an env var named `PIPELINE_<FIELD>`.

use std::collections::HashMap;

use camino::Utf8PathBuf;

use crate::error::ConfigError;
use crate::provider::{LogLevel, Provider};

const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_NOMINAL_CONTEXT_WINDOW: u64 = 200_000;
const DEFAULT_WATCHER_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_WATCHER_QUIET_INTERVAL_MS: u64 = 1_000;
const DEFAULT_WATCHER_WORKERS: usize = 1;

/// The resolved, read-only configuration snapshot.
///
/// Construct via [`Config::from_env`] for process startup, or
/// [`Config::from_map`] directly for deterministic tests and embedding.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
    pub chat_base_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub provider_endpoint: Option<String>,
    pub provider_deployment: Option<String>,
    pub remote_api_token: Option<String>,
    /// Base URL of the remote issue-tracker API the Issue Source Set's
    /// `Remote` selector queries.
    pub remote_base_url: String,
    /// Directory `Mock` selectors resolve against.
    pub mock_dir: Utf8PathBuf,
    pub ingress_dir: Utf8PathBuf,
    pub processed_dir: Utf8PathBuf,
    pub poisoned_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub run_index_path: Utf8PathBuf,
    pub nominal_context_window: u64,
    pub watcher_poll_interval_ms: u64,
    pub watcher_quiet_interval_ms: u64,
    pub watcher_workers: usize,
    pub log_level: LogLevel,
}

impl Config {
    /// Resolve configuration from the process environment, creating any
    /// configured directory that does not yet exist.
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = std::env::vars()
            .filter_map(|(k, v)| k.strip_prefix("PIPELINE_").map(|field| (field.to_string(), v)))
            .collect();
        Self::from_map(&values)
    }

    /// Resolve configuration from an explicit key/value map (env-var names
    /// with the `PIPELINE_` prefix already stripped). Exposed directly so
    /// tests and embedders can avoid mutating process-global environment
    /// state.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let provider = parse_or_default(values, "PROVIDER", "anthropic", "provider")?;
        let model = values.get("MODEL").cloned().unwrap_or_else(|| "anthropic/claude-3-5-sonnet-20241022".to_string());
        let temperature = parse_numeric_or_default(values, "TEMPERATURE", DEFAULT_TEMPERATURE, "temperature")?;
        let log_level = parse_or_default(values, "LOG_LEVEL", "info", "log_level")?;

        let config = Self {
            provider,
            model,
            temperature,
            chat_base_url: values.get("CHAT_BASE_URL").cloned(),
            provider_api_key: values.get("PROVIDER_API_KEY").cloned(),
            provider_endpoint: values.get("PROVIDER_ENDPOINT").cloned(),
            provider_deployment: values.get("PROVIDER_DEPLOYMENT").cloned(),
            remote_api_token: values.get("REMOTE_API_TOKEN").cloned(),
            remote_base_url: values.get("REMOTE_BASE_URL").cloned().unwrap_or_else(|| "https://api.github.com".to_string()),
            mock_dir: path_or_default(values, "MOCK_DIR", "mock"),
            ingress_dir: path_or_default(values, "INGRESS_DIR", "ingress"),
            processed_dir: path_or_default(values, "PROCESSED_DIR", "processed"),
            poisoned_dir: path_or_default(values, "POISONED_DIR", "poisoned"),
            output_dir: path_or_default(values, "OUTPUT_DIR", "output"),
            run_index_path: path_or_default(values, "RUN_INDEX_PATH", "data/pipeline.db"),
            nominal_context_window: parse_numeric_or_default(values, "NOMINAL_CONTEXT_WINDOW", DEFAULT_NOMINAL_CONTEXT_WINDOW as f64, "nominal_context_window")? as u64,
            watcher_poll_interval_ms: parse_numeric_or_default(values, "WATCHER_POLL_INTERVAL_MS", DEFAULT_WATCHER_POLL_INTERVAL_MS as f64, "watcher_poll_interval_ms")? as u64,
            watcher_quiet_interval_ms: parse_numeric_or_default(values, "WATCHER_QUIET_INTERVAL_MS", DEFAULT_WATCHER_QUIET_INTERVAL_MS as f64, "watcher_quiet_interval_ms")? as u64,
            watcher_workers: parse_numeric_or_default(values, "WATCHER_WORKERS", DEFAULT_WATCHER_WORKERS as f64, "watcher_workers")? as usize,
            log_level,
        };

        config.validate_credentials()?;
        config.ensure_directories()?;
        Ok(config)
    }

    fn validate_credentials(&self) -> Result<(), ConfigError> {
        match self.provider {
            Provider::Anthropic | Provider::Openai => {
                if self.provider_api_key.is_none() {
                    return Err(ConfigError::MissingCredential {
                        provider: self.provider.to_string(),
                        field: "provider_api_key",
                    });
                }
            }
            Provider::Azure => {
                if self.provider_api_key.is_none() {
                    return Err(ConfigError::MissingCredential { provider: self.provider.to_string(), field: "provider_api_key" });
                }
                if self.provider_endpoint.is_none() {
                    return Err(ConfigError::MissingCredential { provider: self.provider.to_string(), field: "provider_endpoint" });
                }
                if self.provider_deployment.is_none() {
                    return Err(ConfigError::MissingCredential { provider: self.provider.to_string(), field: "provider_deployment" });
                }
            }
        }
        Ok(())
    }

    fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [&self.ingress_dir, &self.processed_dir, &self.poisoned_dir, &self.output_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryCreation { path: dir.to_string(), reason: e.to_string() })?;
        }
        if let Some(parent) = self.run_index_path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreation { path: parent.to_string(), reason: e.to_string() })?;
            }
        }
        Ok(())
    }
}

fn path_or_default(values: &HashMap<String, String>, key: &str, default: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(values.get(key).cloned().unwrap_or_else(|| default.to_string()))
}

fn parse_or_default<T: std::str::FromStr<Err = String>>(
    values: &HashMap<String, String>,
    key: &str,
    default: &str,
    field: &'static str,
) -> Result<T, ConfigError> {
    let raw = values.get(key).map(String::as_str).unwrap_or(default);
    raw.parse().map_err(|reason| ConfigError::InvalidValue { field, reason })
}

fn parse_numeric_or_default(
    values: &HashMap<String, String>,
    key: &str,
    default: f64,
    field: &'static str,
) -> Result<f64, ConfigError> {
    match values.get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue { field, reason: format!("not a number: {raw}") }),
        None => Ok(default),
    }
}
