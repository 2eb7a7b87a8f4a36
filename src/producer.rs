use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::broker::Broker;
use crate::error::AdmitOutcome;
use crate::message::Message;
use crate::metrics::MetricsEngine;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Assigns message identity (id, per-key sequence, timestamp) and forwards
/// to the broker. Owns the producer-side per-key monotonic sequence map.
pub struct Producer {
    broker: Arc<Broker>,
    metrics: Arc<MetricsEngine>,
    seq_by_key: Mutex<HashMap<String, u64>>,
}

impl Producer {
    pub fn new(broker: Arc<Broker>, metrics: Arc<MetricsEngine>) -> Self {
        Self { broker, metrics, seq_by_key: Mutex::new(HashMap::new()) }
    }

    fn next_seq_for_key(&self, key: &str) -> u64 {
        let mut seqs = self.seq_by_key.lock();
        let entry = seqs.entry(key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// `key = None` defaults to `"key-default"` (single-key workloads).
    pub async fn publish(&self, key: Option<String>, payload: String) -> bool {
        self.publish_with_key(key.unwrap_or_else(|| "key-default".to_string()), payload).await
    }

    /// Hash-bucketed key defaulting for synthetic load generation, per the
    /// `/metrics/mymq/send?keyBuckets=` HTTP route (spec §6).
    pub async fn publish_bucketed(&self, explicit_key: Option<String>, payload: String, key_buckets: u32) -> bool {
        let key = explicit_key.unwrap_or_else(|| {
            let mut hasher = DefaultHasher::new();
            payload.hash(&mut hasher);
            let bucket = (hasher.finish() % key_buckets.max(1) as u64) as u32;
            format!("key-{}", bucket)
        });
        self.publish_with_key(key, payload).await
    }

    async fn publish_with_key(&self, key: String, payload: String) -> bool {
        if payload.is_empty() {
            tracing::warn!("rejected publish with empty payload");
            return false;
        }
        let id = Uuid::new_v4().to_string();
        let ts = now_ms();
        let seq = self.next_seq_for_key(&key);
        let msg = Message::new(id, payload, ts, Some(key), Some(seq));

        let outcome = self.broker.enqueue(msg).await;
        if outcome.is_accepted() {
            self.metrics.inc_uncommitted();
            true
        } else {
            matches!(outcome, AdmitOutcome::RejectedDuplicate)
        }
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dlq::DeadLetterQueue;
    use crate::idempotency::IdempotencyStore;
    use crate::queue::BoundedQueue;
    use crate::replication::ReplicationClient;
    use crate::wal::WriteAheadLog;

    fn test_producer() -> Producer {
        let metrics = Arc::new(MetricsEngine::new());
        let config = Config {
            queue_size: 100,
            dlq_size: 100,
            poll_interval_ms: 50,
            wal_path: String::new(),
            num_consumers: 1,
            node_id: "t".to_string(),
            peers: vec![],
            quorum: 1,
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let wal_path = std::env::temp_dir().join(format!("mymq-producer-test-{}.log", Uuid::new_v4()));
        let broker = Arc::new(Broker::new(
            &config,
            Arc::new(IdempotencyStore::new()),
            Arc::new(WriteAheadLog::new(wal_path)),
            Arc::new(ReplicationClient::new(vec![])),
            Arc::new(BoundedQueue::new(100)),
            Arc::new(DeadLetterQueue::new(100, metrics.clone())),
            metrics.clone(),
        ));
        Producer::new(broker, metrics)
    }

    #[tokio::test]
    async fn publish_defaults_key_and_increments_sequence() {
        let producer = test_producer();
        assert!(producer.publish(None, "a".to_string()).await);
        assert!(producer.publish(None, "b".to_string()).await);
        assert_eq!(*producer.seq_by_key.lock().get("key-default").unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let producer = test_producer();
        assert!(!producer.publish(None, String::new()).await);
    }

    #[tokio::test]
    async fn accepted_publish_increments_uncommitted() {
        let producer = test_producer();
        producer.publish(Some("k".to_string()), "x".to_string()).await;
        assert_eq!(producer.metrics.snapshot().uncommitted_count, 1);
    }
}
