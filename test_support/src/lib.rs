//! ABOUTME: Shared testing utilities and test doubles
//! ABOUTME: Fake stats sources and recording collectors for all crates

use pw_core::{Collector, PoolStats, StatsGetter};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Mutex,
};

/// Stats source whose open connection count grows by one on every read
#[derive(Debug, Default)]
pub struct CountingSource {
    reads: AtomicU64,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `stats` has been called
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl StatsGetter for CountingSource {
    fn stats(&self) -> PoolStats {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        PoolStats {
            max_open_connections: 100,
            open_connections: n,
            in_use: n / 2,
            idle: n - n / 2,
            wait_count: n,
            ..Default::default()
        }
    }
}

/// Collector that records every snapshot it receives, in order
///
/// Also notices if two `collect` calls ever run at the same time.
#[derive(Debug, Default)]
pub struct RecordingCollector {
    samples: Mutex<Vec<PoolStats>>,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<PoolStats> {
        self.samples.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of all-zero snapshots received
    pub fn resets(&self) -> usize {
        self.samples().iter().filter(|s| s.is_zero()).count()
    }

    /// True if any two `collect` calls were ever in flight together
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl Collector for RecordingCollector {
    fn collect(&self, stats: &PoolStats) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        if let Ok(mut samples) = self.samples.lock() {
            samples.push(*stats);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_source_increments() {
        let source = CountingSource::new();
        assert_eq!(source.stats().open_connections, 1);
        assert_eq!(source.stats().open_connections, 2);
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn test_recording_collector_counts_resets() {
        let sink = RecordingCollector::new();
        sink.collect(&PoolStats {
            open_connections: 1,
            ..Default::default()
        });
        sink.collect(&PoolStats::default());

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.resets(), 1);
        assert!(!sink.overlapped());
    }
}
