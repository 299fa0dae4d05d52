//! The Folder Watcher (spec.md §4.7): a polling alternative to the CLI
//! entrypoint, feeding the pipeline from files dropped in an ingress
//! directory instead of a single invocation per issue.

mod config;
mod error;
mod watcher;

pub use config::WatcherConfig;
pub use error::WatcherError;
pub use watcher::{FolderWatcher, WatcherDeps};
