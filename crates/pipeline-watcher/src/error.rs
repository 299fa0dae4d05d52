use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to list ingress directory {path}: {reason}")]
    ListDirectory { path: String, reason: String },

    #[error("failed to create directory {path}: {reason}")]
    CreateDirectory { path: String, reason: String },

    #[error("failed to relocate {from} to {to}: {reason}")]
    Relocate { from: String, to: String, reason: String },
}
