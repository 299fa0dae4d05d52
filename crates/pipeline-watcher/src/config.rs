use std::time::Duration;

use camino::Utf8PathBuf;

/// Tunables for [`crate::FolderWatcher`] (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub ingress_dir: Utf8PathBuf,
    pub processed_dir: Utf8PathBuf,
    pub poisoned_dir: Utf8PathBuf,
    pub poll_interval: Duration,
    pub quiet_interval: Duration,
    pub workers: usize,
}

impl WatcherConfig {
    #[must_use]
    pub fn new(ingress_dir: Utf8PathBuf, processed_dir: Utf8PathBuf, poisoned_dir: Utf8PathBuf) -> Self {
        Self {
            ingress_dir,
            processed_dir,
            poisoned_dir,
            poll_interval: Duration::from_millis(500),
            quiet_interval: Duration::from_millis(1_000),
            workers: 1,
        }
    }

    /// A sibling of `ingress_dir` used as the rename-based exclusivity check
    /// (spec.md §4.7: "degrades to: a rename into a sibling staging
    /// directory succeeds").
    #[must_use]
    pub fn staging_dir(&self) -> Utf8PathBuf {
        self.ingress_dir.join(".staging")
    }
}
