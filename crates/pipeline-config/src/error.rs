use thiserror::Error;

use pipeline_types::PipelineError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("missing required credential for provider {provider}: {field}")]
    MissingCredential { provider: String, field: &'static str },

    #[error("failed to create directory {path}: {reason}")]
    DirectoryCreation { path: String, reason: String },
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::InvalidInput(err.to_string())
    }
}
