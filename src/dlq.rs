use std::sync::Arc;

use crate::message::Message;
use crate::metrics::MetricsEngine;
use crate::queue::BoundedQueue;

/// Bounded overflow sink. Same shape as the main queue; a full DLQ drops the
/// message and is accounted as a processing failure rather than a DLQ event,
/// preserving the invariant that `dlqCount <= capacity`.
pub struct DeadLetterQueue {
    inner: BoundedQueue,
    metrics: Arc<MetricsEngine>,
}

impl DeadLetterQueue {
    pub fn new(capacity: usize, metrics: Arc<MetricsEngine>) -> Self {
        Self { inner: BoundedQueue::new(capacity), metrics }
    }

    pub fn add(&self, msg: Message) {
        match self.inner.offer(msg) {
            Ok(()) => self.metrics.record_dlq(),
            Err(_) => {
                tracing::warn!("DLQ full, dropping message");
                self.metrics.record_failure();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
