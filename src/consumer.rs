use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

use crate::broker::Broker;
use crate::idempotency::IdempotencyStore;
use crate::message::Message;
use crate::metrics::MetricsEngine;

const DEDUPE_WINDOW_SIZE: usize = 100_000;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Bounded FIFO + set used for post-admission dedup under at-least-once
/// delivery, separate from the admission-time `IdempotencyStore`. Shared
/// across every worker in the pool — it models one process-wide dedup
/// window, not a per-worker one.
struct DedupeWindow {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl DedupeWindow {
    fn with_capacity(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::new(), seen: HashSet::new() }
    }

    /// Returns true if `id` was already present. Inserts and evicts the
    /// oldest entry if the window exceeds capacity.
    fn check_and_insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return true;
        }
        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        false
    }
}

/// RAII guard ensuring `dec_uncommitted` runs exactly once per polled
/// message, regardless of which branch below returns early.
struct UncommittedGuard<'a> {
    metrics: &'a MetricsEngine,
}

impl<'a> UncommittedGuard<'a> {
    fn new(metrics: &'a MetricsEngine) -> Self {
        Self { metrics }
    }
}

impl Drop for UncommittedGuard<'_> {
    fn drop(&mut self) {
        self.metrics.dec_uncommitted();
    }
}

/// Pool of N worker loops competitively polling the broker's queue. Workers
/// share a single dedupe window and per-key sequence map — only the polling
/// itself is per-worker; dedup and order-violation detection are process-wide.
pub struct ConsumerPool {
    broker: Arc<Broker>,
    metrics: Arc<MetricsEngine>,
    idempotency: Arc<IdempotencyStore>,
    poll_interval_ms: u64,
    running: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    dedupe: Arc<Mutex<DedupeWindow>>,
    last_seq_by_key: Arc<Mutex<HashMap<String, u64>>>,
}

impl ConsumerPool {
    pub fn new(
        broker: Arc<Broker>,
        metrics: Arc<MetricsEngine>,
        idempotency: Arc<IdempotencyStore>,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            broker,
            metrics,
            idempotency,
            poll_interval_ms,
            running: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
            dedupe: Arc::new(Mutex::new(DedupeWindow::with_capacity(DEDUPE_WINDOW_SIZE))),
            last_seq_by_key: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn start(&self, num_consumers: usize) {
        self.running.store(true, Ordering::SeqCst);
        let mut handles = self.handles.lock();
        for worker_id in 0..num_consumers {
            let broker = self.broker.clone();
            let metrics = self.metrics.clone();
            let idempotency = self.idempotency.clone();
            let running = self.running.clone();
            let poll_interval_ms = self.poll_interval_ms;
            let dedupe = self.dedupe.clone();
            let last_seq_by_key = self.last_seq_by_key.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, broker, metrics, idempotency, running, poll_interval_ms, dedupe, last_seq_by_key).await;
            }));
        }
    }

    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    broker: Arc<Broker>,
    metrics: Arc<MetricsEngine>,
    idempotency: Arc<IdempotencyStore>,
    running: Arc<AtomicBool>,
    poll_interval_ms: u64,
    dedupe: Arc<Mutex<DedupeWindow>>,
    last_seq_by_key: Arc<Mutex<HashMap<String, u64>>>,
) {
    while running.load(Ordering::SeqCst) {
        let msg = match broker.poll(50).await {
            Some(msg) => msg,
            None => {
                tokio::time::sleep(std::time::Duration::from_millis(poll_interval_ms.max(1))).await;
                continue;
            }
        };

        let _guard = UncommittedGuard::new(&metrics);
        let latency_ms = now_ms().saturating_sub(msg.timestamp);

        let is_duplicate = dedupe.lock().check_and_insert(&msg.id);
        if is_duplicate {
            metrics.record_duplicate();
            tracing::debug!(worker_id, id = %msg.id, "post-admission duplicate skipped");
            continue; // guard drops here, decrementing uncommitted exactly once
        }

        if let (Some(key), Some(seq)) = (msg.key.as_ref(), msg.sequence) {
            let mut last_seq = last_seq_by_key.lock();
            match last_seq.get(key).copied() {
                Some(prev) if seq <= prev => {
                    metrics.record_order_violation();
                    tracing::warn!(worker_id, %key, seq, prev, "order violation");
                    last_seq.insert(key.clone(), prev.max(seq));
                }
                Some(prev) => {
                    last_seq.insert(key.clone(), prev.max(seq));
                }
                None => {
                    last_seq.insert(key.clone(), seq);
                }
            }
        }

        match process(&msg) {
            Ok(()) => {
                metrics.record_success(latency_ms);
                idempotency.remove_processed(&msg.id);
            }
            Err(err) => {
                metrics.record_failure();
                tracing::warn!(worker_id, id = %msg.id, ?err, "message processing failed");
            }
        }
    }
}

/// Processing extension point. The broker's own workload has no business
/// logic beyond accounting, so this always succeeds; a real deployment would
/// replace this with the consumer's actual handler.
fn process(_msg: &Message) -> Result<(), anyhow::Error> {
    Ok(())
}
