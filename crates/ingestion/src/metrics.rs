//! Source read counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Source metrics
///
/// Shared between the reading thread and whoever reports on it.
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Records decoded
    pub messages_read: AtomicU64,

    /// Raw bytes consumed
    pub bytes_read: AtomicU64,

    /// Blank lines skipped
    pub blank_lines: AtomicU64,
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one decoded message of `bytes` raw bytes
    pub fn record_message(&self, bytes: usize) {
        self.messages_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_blank_line(&self) {
        self.blank_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_read: self.messages_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            blank_lines: self.blank_lines.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_read: u64,
    pub bytes_read: u64,
    pub blank_lines: u64,
}
