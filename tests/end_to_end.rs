use std::sync::Arc;
use std::time::Duration;

use mymq_broker::broker::Broker;
use mymq_broker::config::Config;
use mymq_broker::consumer::ConsumerPool;
use mymq_broker::dlq::DeadLetterQueue;
use mymq_broker::idempotency::IdempotencyStore;
use mymq_broker::message::Message;
use mymq_broker::metrics::MetricsEngine;
use mymq_broker::producer::Producer;
use mymq_broker::queue::BoundedQueue;
use mymq_broker::replication::ReplicationClient;
use mymq_broker::wal::WriteAheadLog;

struct Harness {
    broker: Arc<Broker>,
    producer: Arc<Producer>,
    metrics: Arc<MetricsEngine>,
    idempotency: Arc<IdempotencyStore>,
    consumer_pool: Arc<ConsumerPool>,
    _wal_dir: tempfile::TempDir,
}

fn build_harness(queue_size: usize, dlq_size: usize, peers: Vec<String>, quorum: usize, num_consumers: usize) -> Harness {
    let metrics = Arc::new(MetricsEngine::new());
    let idempotency = Arc::new(IdempotencyStore::new());
    let wal_dir = tempfile::tempdir().unwrap();
    let wal = Arc::new(WriteAheadLog::new(wal_dir.path().join("wal.log")));
    let config = Config {
        queue_size,
        dlq_size,
        poll_interval_ms: 10,
        wal_path: wal_dir.path().join("wal.log").to_string_lossy().to_string(),
        num_consumers,
        node_id: "n1".to_string(),
        peers: peers.clone(),
        quorum,
        bind_addr: "127.0.0.1:0".to_string(),
    };
    let broker = Arc::new(Broker::new(
        &config,
        idempotency.clone(),
        wal,
        Arc::new(ReplicationClient::new(peers)),
        Arc::new(BoundedQueue::new(queue_size)),
        Arc::new(DeadLetterQueue::new(dlq_size, metrics.clone())),
        metrics.clone(),
    ));
    let producer = Arc::new(Producer::new(broker.clone(), metrics.clone()));
    let consumer_pool = Arc::new(ConsumerPool::new(
        broker.clone(),
        metrics.clone(),
        idempotency.clone(),
        config.poll_interval_ms,
    ));
    Harness { broker, producer, metrics, idempotency, consumer_pool, _wal_dir: wal_dir }
}

/// Scenario 1: single producer, single consumer, 1000 messages, no failures.
#[tokio::test]
async fn scenario_single_producer_single_consumer_no_failures() {
    let h = build_harness(10_000, 1_000, vec![], 1, 1);
    h.consumer_pool.start(1);

    for i in 0..1_000 {
        assert!(h.producer.publish(None, format!("payload-{}", i)).await);
    }

    wait_until(&h, |snap| snap.success_count == 1_000, Duration::from_secs(5)).await;

    let snap = h.metrics.snapshot();
    assert_eq!(snap.total_messages, 1_000);
    assert_eq!(snap.success_count, 1_000);
    assert_eq!(snap.fail_count, 0);
    assert_eq!(snap.duplicate_count, 0);
    assert_eq!(snap.order_violation_count, 0);
    assert_eq!(snap.dlq_count, 0);
    assert_eq!(snap.uncommitted_count, 0);
    assert!(snap.p95_latency_ms >= 0);
    assert!(snap.p99_latency_ms >= snap.p95_latency_ms || snap.p99_latency_ms == 0);

    h.consumer_pool.shutdown().await;
}

/// Scenario 2: duplicate injection, both admission-side and post-admission.
#[tokio::test]
async fn scenario_duplicate_injection() {
    let h = build_harness(100, 100, vec![], 1, 1);

    let msg = Message::new("fixed-id".to_string(), "hello".to_string(), now_ms(), None, None);
    let first = h.broker.enqueue(msg.clone()).await;
    let second = h.broker.enqueue(msg).await;
    assert!(first.is_accepted());
    assert!(!second.is_accepted());
    assert_eq!(h.metrics.snapshot().duplicate_count, 1);

    // Drain it through a consumer so the id is released from admission-time tracking.
    h.consumer_pool.start(1);
    wait_until(&h, |snap| snap.success_count == 1, Duration::from_secs(2)).await;
    h.consumer_pool.shutdown().await;

    // Feed the same id through peer ingress twice: post-admission dedup fires once more.
    let replay1 = Message::new("fixed-id".to_string(), "hello".to_string(), now_ms(), None, None);
    let replay2 = Message::new("fixed-id".to_string(), "hello".to_string(), now_ms(), None, None);
    assert!(h.broker.enqueue_from_peer(replay1).await.is_accepted());
    assert!(h.broker.enqueue_from_peer(replay2).await.is_accepted()); // admission-time store was cleared; queue accepts both

    h.consumer_pool.start(1);
    wait_until(&h, |snap| snap.duplicate_count >= 2, Duration::from_secs(2)).await;
    h.consumer_pool.shutdown().await;
}

/// Scenario 3: queue overflow with no consumer draining it.
#[tokio::test]
async fn scenario_queue_overflow_routes_excess_to_dlq() {
    let h = build_harness(16, 1_000, vec![], 1, 0); // no consumers: queue fills up
    for i in 0..64 {
        h.producer.publish(None, format!("p-{}", i)).await;
    }
    let snap = h.metrics.snapshot();
    assert_eq!(h.broker.queue().len(), 16);
    assert_eq!(snap.dlq_count, 48);
    assert_eq!(snap.fail_count, 0);
}

/// Scenario 4: quorum failure — every publish is rejected to the DLQ.
#[tokio::test]
async fn scenario_quorum_failure_rejects_everything() {
    let h = build_harness(100, 100, vec!["http://127.0.0.1:1".to_string(), "http://127.0.0.1:2".to_string()], 2, 0);
    for i in 0..5 {
        h.producer.publish(None, format!("q-{}", i)).await;
    }
    let snap = h.metrics.snapshot();
    assert_eq!(snap.success_count, 0);
    assert_eq!(snap.dlq_count, 5);
}

/// Scenario 5: two producer threads collide on a single key with out-of-order
/// sequences; exactly one order violation should be recorded.
#[tokio::test]
async fn scenario_order_violation_on_shared_key() {
    let h = build_harness(100, 100, vec![], 1, 1);
    h.consumer_pool.start(1);

    // Sequences 1,2,3,5,4,6 hand-crafted directly (bypassing the producer's
    // own monotonic allocator, modeling two colluding producer threads).
    let sequences = [1u64, 2, 3, 5, 4, 6];
    for seq in sequences {
        let msg = Message::new(
            uuid::Uuid::new_v4().to_string(),
            "x".to_string(),
            now_ms(),
            Some("k".to_string()),
            Some(seq),
        );
        h.broker.enqueue(msg).await;
    }

    wait_until(&h, |snap| snap.success_count == 6, Duration::from_secs(5)).await;
    assert_eq!(h.metrics.snapshot().order_violation_count, 1);
    h.consumer_pool.shutdown().await;
}

/// Scenario 6: reset zeros every counter and a subsequent publish still works.
#[tokio::test]
async fn scenario_reset_zeros_counters_and_allows_republish() {
    let h = build_harness(100, 100, vec![], 1, 1);
    h.consumer_pool.start(1);
    for i in 0..10 {
        h.producer.publish(None, format!("r-{}", i)).await;
    }
    wait_until(&h, |snap| snap.success_count == 10, Duration::from_secs(5)).await;

    h.metrics.reset_all();
    h.idempotency.clear();
    let snap = h.metrics.snapshot();
    assert_eq!(snap.total_messages, 0);
    assert_eq!(snap.success_count, 0);
    assert_eq!(snap.p95_latency_ms, 0);

    assert!(h.producer.publish(None, "after-reset".to_string()).await);
    wait_until(&h, |snap| snap.success_count == 1, Duration::from_secs(5)).await;
    h.consumer_pool.shutdown().await;
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

async fn wait_until(
    h: &Harness,
    pred: impl Fn(&mymq_broker::metrics::MetricsSnapshot) -> bool,
    max_wait: Duration,
) {
    let start = std::time::Instant::now();
    loop {
        if pred(&h.metrics.snapshot()) {
            return;
        }
        if start.elapsed() > max_wait {
            panic!("condition not met within {:?}, snapshot = {:?}", max_wait, h.metrics.snapshot());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
