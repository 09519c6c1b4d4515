//! Stream statistics
//!
//! Underruns and queue overflows are accepted degradations, not errors. They
//! are counted here so the firmware can report them.

use core::sync::atomic::{AtomicU32, Ordering};

/// Counters updated from interrupt and pump context
pub struct StreamStats {
    /// Halves filled with fresh samples
    pub fills: AtomicU32,
    /// Halves left stale because too few bytes were queued
    pub underruns: AtomicU32,
    /// Received bytes dropped because the queue was full
    pub dropped_bytes: AtomicU32,
    /// Completed feedback measurement windows
    pub feedback_windows: AtomicU32,
}

/// Point-in-time copy of [`StreamStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub fills: u32,
    pub underruns: u32,
    pub dropped_bytes: u32,
    pub feedback_windows: u32,
}

impl StreamStats {
    pub const fn new() -> Self {
        Self {
            fills: AtomicU32::new(0),
            underruns: AtomicU32::new(0),
            dropped_bytes: AtomicU32::new(0),
            feedback_windows: AtomicU32::new(0),
        }
    }

    pub fn record_fill(&self) {
        self.fills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, bytes: usize) {
        self.dropped_bytes.fetch_add(bytes as u32, Ordering::Relaxed);
    }

    pub fn record_feedback_window(&self) {
        self.feedback_windows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fills: self.fills.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            dropped_bytes: self.dropped_bytes.load(Ordering::Relaxed),
            feedback_windows: self.feedback_windows.load(Ordering::Relaxed),
        }
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}
