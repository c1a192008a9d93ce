//! Observability hooks for the read path.
//!
//! A [`StreamMetrics`] sink is injected when the stream is built and defaults
//! to [`NoopMetrics`]. The hooks only observe; they never influence what
//! `read()` returns.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
pub trait StreamMetrics: Send + Sync {
    /// Wall time of one `read()` call, suspension included.
    fn record_read_latency(&self, _latency: Duration) {}

    /// Queue length observed when a read starts on an open stream.
    fn record_queue_length(&self, _len: usize) {}

    /// Payload bytes folded into one coalesced chunk.
    fn record_accumulated_bytes(&self, _bytes: usize) {}

    /// Time spent draining and merging for one coalesced chunk.
    fn record_accumulation_latency(&self, _latency: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl StreamMetrics for NoopMetrics {}

/// A lock-free, counter based sink.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    reads: AtomicU64,
    read_nanos: AtomicU64,
    max_queue_length: AtomicUsize,
    accumulations: AtomicU64,
    accumulated_bytes: AtomicU64,
    accumulation_nanos: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reads: u64,
    pub read_time: Duration,
    pub max_queue_length: usize,
    pub accumulations: u64,
    pub accumulated_bytes: u64,
    pub accumulation_time: Duration,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            read_time: Duration::from_nanos(self.read_nanos.load(Ordering::Relaxed)),
            max_queue_length: self.max_queue_length.load(Ordering::Relaxed),
            accumulations: self.accumulations.load(Ordering::Relaxed),
            accumulated_bytes: self.accumulated_bytes.load(Ordering::Relaxed),
            accumulation_time: Duration::from_nanos(self.accumulation_nanos.load(Ordering::Relaxed)),
        }
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl StreamMetrics for AtomicMetrics {
    fn record_read_latency(&self, latency: Duration) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.read_nanos.fetch_add(saturating_nanos(latency), Ordering::Relaxed);
    }

    fn record_queue_length(&self, len: usize) {
        self.max_queue_length.fetch_max(len, Ordering::Relaxed);
    }

    fn record_accumulated_bytes(&self, bytes: usize) {
        self.accumulations.fetch_add(1, Ordering::Relaxed);
        self.accumulated_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_accumulation_latency(&self, latency: Duration) {
        self.accumulation_nanos.fetch_add(saturating_nanos(latency), Ordering::Relaxed);
    }
}
