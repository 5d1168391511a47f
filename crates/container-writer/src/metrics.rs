//! Writer counters and timing

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cumulative counters, updated by the writer thread.
///
/// Shared through `Arc` so supervisors can observe progress while the
/// writer runs.
#[derive(Debug, Default)]
pub struct WriterMetrics {
    containers_written: AtomicU64,
    bytes_written: AtomicU64,
    write_nanos: AtomicU64,
}

impl WriterMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one committed container.
    pub fn record_write(&self, bytes: usize, elapsed: Option<Duration>) {
        self.containers_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
        if let Some(elapsed) = elapsed {
            let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
            self.write_nanos.fetch_add(nanos, Ordering::Relaxed);
        }
    }

    /// Containers committed so far.
    pub fn containers_written(&self) -> u64 {
        self.containers_written.load(Ordering::Relaxed)
    }

    /// Payload bytes committed so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Time spent inside the persistence routine.
    ///
    /// Stays zero unless timing is enabled.
    pub fn write_time(&self) -> Duration {
        Duration::from_nanos(self.write_nanos.load(Ordering::Relaxed))
    }
}

/// Snapshot returned when the writer loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Containers popped and committed during the run
    pub containers_written: u64,
    /// Payload bytes committed during the run
    pub bytes_written: u64,
    /// Time spent persisting, when timing is enabled
    pub write_time: Option<Duration>,
    /// Wall time from loop start to loop end
    pub total_time: Duration,
}
