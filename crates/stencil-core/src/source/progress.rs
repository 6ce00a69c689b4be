//! Download progress reporting

use std::collections::HashMap;
use std::sync::Mutex;

/// Receives progress notifications while a remote module is fetched
pub trait ProgressSink: Send + Sync {
    /// Called for every chunk received from `uri`; `total` is 0 when unknown
    fn track_progress(&self, uri: &str, current: u64, total: u64);
}

/// Counts progress notifications per source
///
/// Used for observability only; nothing in the core branches on these counts.
#[derive(Debug, Default)]
pub struct ProgressTracking {
    downloaded: Mutex<HashMap<String, usize>>,
}

impl ProgressTracking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications seen for `uri`
    pub fn attempts(&self, uri: &str) -> usize {
        let downloaded = self.downloaded.lock().unwrap_or_else(|e| e.into_inner());
        downloaded.get(uri).copied().unwrap_or(0)
    }
}

impl ProgressSink for ProgressTracking {
    fn track_progress(&self, uri: &str, current: u64, total: u64) {
        let mut downloaded = self.downloaded.lock().unwrap_or_else(|e| e.into_inner());
        let count = downloaded.entry(uri.to_string()).or_insert(0);
        *count += 1;

        tracing::trace!(uri, current, total, chunks = *count, "download progress");
    }
}
