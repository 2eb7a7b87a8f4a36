use std::sync::Arc;

use crate::config::Config;
use crate::dlq::DeadLetterQueue;
use crate::error::AdmitOutcome;
use crate::idempotency::IdempotencyStore;
use crate::message::Message;
use crate::metrics::MetricsEngine;
use crate::queue::BoundedQueue;
use crate::replication::ReplicationClient;
use crate::wal::WriteAheadLog;

/// Orchestrates admission through idempotency, durability, replication,
/// quorum, and final queue placement. Holds references to its collaborators
/// only; nothing points back at the broker.
pub struct Broker {
    idempotency: Arc<IdempotencyStore>,
    wal: Arc<WriteAheadLog>,
    replication: Arc<ReplicationClient>,
    queue: Arc<BoundedQueue>,
    dlq: Arc<DeadLetterQueue>,
    metrics: Arc<MetricsEngine>,
    quorum: usize,
}

impl Broker {
    pub fn new(
        config: &Config,
        idempotency: Arc<IdempotencyStore>,
        wal: Arc<WriteAheadLog>,
        replication: Arc<ReplicationClient>,
        queue: Arc<BoundedQueue>,
        dlq: Arc<DeadLetterQueue>,
        metrics: Arc<MetricsEngine>,
    ) -> Self {
        // cfg.quorum <= 0 coerces to 1; Config::from_env already enforces .max(1).
        let quorum = config.quorum.max(1);
        Self { idempotency, wal, replication, queue, dlq, metrics, quorum }
    }

    pub fn queue(&self) -> &Arc<BoundedQueue> {
        &self.queue
    }

    pub fn metrics(&self) -> &Arc<MetricsEngine> {
        &self.metrics
    }

    /// Producer path: admission -> WAL -> replicate -> quorum -> offer.
    pub async fn enqueue(&self, msg: Message) -> AdmitOutcome {
        if self.idempotency.already_processed(&msg.id) {
            self.metrics.record_duplicate();
            return AdmitOutcome::RejectedDuplicate;
        }

        self.wal.append(&msg);

        let peer_acks = self.replication.replicate(&msg).await;
        let acks = 1 + peer_acks; // self always acks
        let peer_count = self.replication.peer_count();
        let needed = self.quorum.clamp(1, 1 + peer_count);
        if acks < needed {
            self.dlq.add(msg);
            return AdmitOutcome::RejectedQuorum;
        }

        match self.queue.offer(msg) {
            Ok(()) => AdmitOutcome::Accepted,
            Err(msg) => {
                self.dlq.add(msg);
                AdmitOutcome::RejectedFull
            }
        }
    }

    /// Replica ingress: skips replication and quorum. Increments uncommitted
    /// itself since no local producer call will do so for peer-originated work.
    pub async fn enqueue_from_peer(&self, msg: Message) -> AdmitOutcome {
        if self.idempotency.already_processed(&msg.id) {
            self.metrics.record_duplicate();
            return AdmitOutcome::RejectedDuplicate;
        }

        self.wal.append(&msg);

        match self.queue.offer(msg) {
            Ok(()) => {
                self.metrics.inc_uncommitted();
                AdmitOutcome::Accepted
            }
            Err(msg) => {
                self.dlq.add(msg);
                AdmitOutcome::RejectedFull
            }
        }
    }

    pub async fn poll(&self, timeout_ms: u64) -> Option<Message> {
        self.queue.poll(timeout_ms).await
    }
}
