//! Per-sink counters shared between a SinkHandle and its worker

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters for one sink
///
/// Written by the handle (drops, queue depth) and by the worker (writes,
/// failures). Read through [`SinkMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct SinkMetrics {
    queued: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    packets: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queued.store(len, Ordering::Relaxed);
    }

    /// Count a successful write of a segment holding `packets` packets
    pub fn record_write(&self, packets: usize) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.packets.fetch_add(packets as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a segment the queue did not accept
    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queued.load(Ordering::Relaxed),
            write_count: self.written.load(Ordering::Relaxed),
            failure_count: self.failed.load(Ordering::Relaxed),
            dropped_count: self.dropped.load(Ordering::Relaxed),
            packet_count: self.packets.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub packet_count: u64,
}

impl MetricsSnapshot {
    /// Segments that never reached the sink, for either reason
    pub fn lost(&self) -> u64 {
        self.failure_count + self.dropped_count
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "written={} packets={} failed={} dropped={} queued={}",
            self.write_count, self.packet_count, self.failure_count, self.dropped_count, self.queue_len
        )
    }
}
