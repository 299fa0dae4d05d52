//! Emits `$/progress` notifications onto the shared outbound line channel,
//! correlated to the request id they were spawned for (spec.md §4.8).

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::ProgressNotification;

pub struct ProgressSink {
    id: Value,
    out: UnboundedSender<String>,
}

impl ProgressSink {
    #[must_use]
    pub fn new(id: Value, out: UnboundedSender<String>) -> Self {
        Self { id, out }
    }

    /// Best-effort: a dropped receiver (writer task gone) is not this
    /// method's problem, advisory notifications are never required for
    /// correctness.
    pub fn emit(&self, fraction: f64, stage: &str) {
        let note = ProgressNotification::new(self.id.clone(), fraction, stage);
        if let Ok(line) = serde_json::to_string(&note) {
            let _ = self.out.send(line);
        }
    }
}
