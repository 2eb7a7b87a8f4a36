pub mod ring;
pub mod window;

use ring::LatencyRing;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use window::LatencyWindow;

const LAT_BUF_SIZE: usize = 10_000;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cumulative or windowed metrics, in the exact shape the HTTP surface
/// reports under `/metrics` and `/metrics/window`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct MetricsSnapshot {
    #[serde(rename = "totalMessages")]
    pub total_messages: u64,
    #[serde(rename = "successCount")]
    pub success_count: u64,
    #[serde(rename = "failCount")]
    pub fail_count: u64,
    #[serde(rename = "avgLatencyMs")]
    pub avg_latency_ms: f64,
    #[serde(rename = "p95LatencyMs")]
    pub p95_latency_ms: u64,
    #[serde(rename = "p99LatencyMs")]
    pub p99_latency_ms: u64,
    #[serde(rename = "duplicateCount")]
    pub duplicate_count: u64,
    #[serde(rename = "orderViolationCount")]
    pub order_violation_count: u64,
    #[serde(rename = "uncommittedCount")]
    pub uncommitted_count: i64,
    #[serde(rename = "dlqCount")]
    pub dlq_count: u64,
    #[serde(rename = "recoveryTimeMs")]
    pub recovery_time_ms: u64,
    #[serde(rename = "recoveredMessages")]
    pub recovered_messages: u64,
}

/// Process-scoped metrics engine. Counters are lock-free atomics; the
/// windowed deque is guarded by its own mutex. No component other than this
/// one touches these fields directly.
pub struct MetricsEngine {
    total: AtomicU64,
    success: AtomicU64,
    fail: AtomicU64,
    duplicate: AtomicU64,
    order_violation: AtomicU64,
    uncommitted: AtomicI64,
    dlq: AtomicU64,
    recovery_time_ms: AtomicU64,
    recovered_messages: AtomicU64,
    total_latency: AtomicU64,
    samples: AtomicU64,
    ring: LatencyRing,
    window: LatencyWindow,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            duplicate: AtomicU64::new(0),
            order_violation: AtomicU64::new(0),
            uncommitted: AtomicI64::new(0),
            dlq: AtomicU64::new(0),
            recovery_time_ms: AtomicU64::new(0),
            recovered_messages: AtomicU64::new(0),
            total_latency: AtomicU64::new(0),
            samples: AtomicU64::new(0),
            ring: LatencyRing::new(LAT_BUF_SIZE),
            window: LatencyWindow::new(),
        }
    }

    pub fn record_success(&self, latency_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.success.fetch_add(1, Ordering::Relaxed);
        self.total_latency.fetch_add(latency_ms, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.ring.record(latency_ms);
        self.window.record(now_ms(), latency_ms);
    }

    pub fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.fail.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_violation(&self) {
        self.order_violation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dlq(&self) {
        self.dlq.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_uncommitted(&self) {
        self.uncommitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_uncommitted(&self) {
        let prev = self.uncommitted.fetch_sub(1, Ordering::Relaxed);
        if prev - 1 < 0 {
            tracing::warn!(uncommitted = prev - 1, "uncommitted counter went negative");
        }
    }

    pub fn record_recovery_time(&self, ms: u64) {
        self.recovery_time_ms.store(ms, Ordering::Relaxed);
    }

    pub fn record_recovery_message(&self) {
        self.recovered_messages.fetch_add(1, Ordering::Relaxed);
    }

    fn avg_latency(&self) -> f64 {
        let samples = self.samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0.0;
        }
        self.total_latency.load(Ordering::Relaxed) as f64 / samples as f64
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_messages: self.total.load(Ordering::Relaxed),
            success_count: self.success.load(Ordering::Relaxed),
            fail_count: self.fail.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency(),
            p95_latency_ms: self.ring.p95(),
            p99_latency_ms: self.ring.p99(),
            duplicate_count: self.duplicate.load(Ordering::Relaxed),
            order_violation_count: self.order_violation.load(Ordering::Relaxed),
            uncommitted_count: self.uncommitted.load(Ordering::Relaxed),
            dlq_count: self.dlq.load(Ordering::Relaxed),
            recovery_time_ms: self.recovery_time_ms.load(Ordering::Relaxed),
            recovered_messages: self.recovered_messages.load(Ordering::Relaxed),
        }
    }

    pub fn window_snapshot(&self, window_ms: u64) -> MetricsSnapshot {
        let now = now_ms();
        let samples = self.window.snapshot(now, window_ms);
        let p95 = ring::percentile_of(&samples, 0.95);
        let p99 = ring::percentile_of(&samples, 0.99);
        let mut snap = self.snapshot();
        snap.p95_latency_ms = p95;
        snap.p99_latency_ms = p99;
        snap
    }

    pub fn reset_all(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.success.store(0, Ordering::Relaxed);
        self.fail.store(0, Ordering::Relaxed);
        self.duplicate.store(0, Ordering::Relaxed);
        self.order_violation.store(0, Ordering::Relaxed);
        self.uncommitted.store(0, Ordering::Relaxed);
        self.dlq.store(0, Ordering::Relaxed);
        self.recovery_time_ms.store(0, Ordering::Relaxed);
        self.recovered_messages.store(0, Ordering::Relaxed);
        self.reset_latency_window();
    }

    pub fn reset_latency_window(&self) {
        self.total_latency.store(0, Ordering::Relaxed);
        self.samples.store(0, Ordering::Relaxed);
        self.ring.reset();
        self.window.reset();
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}
