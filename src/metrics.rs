// Performance metrics module
//
// Provides lightweight counters for the generation pipeline

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide pipeline metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Shared as
/// `Arc<Metrics>` between the pipeline and the front end and logged on
/// shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Requests that reached the encoding phase
    pub encodes_started: AtomicU64,

    pub encodes_succeeded: AtomicU64,

    pub encodes_failed: AtomicU64,

    /// Requests rejected before encoding
    pub validation_failures: AtomicU64,

    /// Submits rejected because a request was already in flight
    pub busy_rejections: AtomicU64,

    pub cancellations: AtomicU64,

    pub downloads: AtomicU64,

    /// Successful shares and clipboard copies
    pub shares: AtomicU64,

    /// Total encode time in milliseconds
    pub total_encode_time_ms: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            encodes_started: AtomicU64::new(0),
            encodes_succeeded: AtomicU64::new(0),
            encodes_failed: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            busy_rejections: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            shares: AtomicU64::new(0),
            total_encode_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_encode_started(&self) {
        self.encodes_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful encode and the time it took
    pub fn record_encode_succeeded(&self, duration: Duration) {
        self.encodes_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_encode_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_encode_failed(&self) {
        self.encodes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy_rejection(&self) {
        self.busy_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_share(&self) {
        self.shares.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average encode time per successful encode in milliseconds
    pub fn avg_encode_time_ms(&self) -> f64 {
        let total = self.total_encode_time_ms.load(Ordering::Relaxed);
        let count = self.encodes_succeeded.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Encodes: {} started, {} succeeded, {} failed, {} cancelled",
            self.encodes_started.load(Ordering::Relaxed),
            self.encodes_succeeded.load(Ordering::Relaxed),
            self.encodes_failed.load(Ordering::Relaxed),
            self.cancellations.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Rejected: {} invalid, {} busy",
            self.validation_failures.load(Ordering::Relaxed),
            self.busy_rejections.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total encode time: {:.2}s (avg: {:.2}ms per code)",
            self.total_encode_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_encode_time_ms()
        );
        tracing::info!(
            "Downloads: {}, shares: {}",
            self.downloads.load(Ordering::Relaxed),
            self.shares.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
