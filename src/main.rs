use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mymq_broker::api::{router, AppState};
use mymq_broker::broker::Broker;
use mymq_broker::config::Config;
use mymq_broker::consumer::ConsumerPool;
use mymq_broker::dlq::DeadLetterQueue;
use mymq_broker::idempotency::IdempotencyStore;
use mymq_broker::kafka_client::KafkaClient;
use mymq_broker::metrics::MetricsEngine;
use mymq_broker::producer::Producer;
use mymq_broker::queue::BoundedQueue;
use mymq_broker::replication::ReplicationClient;
use mymq_broker::wal::WriteAheadLog;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    tracing::info!(node_id = %config.node_id, peers = ?config.peers, quorum = config.quorum, "starting mymq broker");

    let metrics = Arc::new(MetricsEngine::new());
    let idempotency = Arc::new(IdempotencyStore::new());
    let wal = Arc::new(WriteAheadLog::new(config.wal_path.clone()));
    let replication = Arc::new(ReplicationClient::new(config.peers.clone()));
    let queue = Arc::new(BoundedQueue::new(config.queue_size));
    let dlq = Arc::new(DeadLetterQueue::new(config.dlq_size, metrics.clone()));

    let broker = Arc::new(Broker::new(
        &config,
        idempotency.clone(),
        wal.clone(),
        replication,
        queue,
        dlq,
        metrics.clone(),
    ));

    let replayed = wal.replay();
    if !replayed.is_empty() {
        let start = std::time::Instant::now();
        let mut recovered = 0u64;
        for msg in replayed {
            if broker.enqueue_from_peer(msg).await.is_accepted() {
                recovered += 1;
                metrics.record_recovery_message();
            }
        }
        metrics.record_recovery_time(start.elapsed().as_millis() as u64);
        tracing::info!(recovered, "WAL recovery replay complete");
    }

    let consumer_pool = Arc::new(ConsumerPool::new(
        broker.clone(),
        metrics.clone(),
        idempotency.clone(),
        config.poll_interval_ms,
    ));
    consumer_pool.start(config.num_consumers);

    let producer = Arc::new(Producer::new(broker.clone(), metrics.clone()));
    let kafka = Arc::new(KafkaClient::new());

    let state = AppState { broker, producer, metrics, idempotency, kafka };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    consumer_pool.shutdown().await;
    Ok(())
}
