use std::time::Duration;

use crate::message::Message;

const REPLICATION_TIMEOUT: Duration = Duration::from_millis(800);

/// Fans a single message out to every peer as one unary POST each, counting
/// 2xx responses toward a replication quorum. Never retries synchronously,
/// never reorders or batches — one fan-out per admission.
pub struct ReplicationClient {
    http: reqwest::Client,
    peers: Vec<String>,
}

impl ReplicationClient {
    pub fn new(peers: Vec<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REPLICATION_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, peers }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Returns the number of acks gathered from peers (self is not counted
    /// here — the caller adds 1 for itself per spec §4.6).
    pub async fn replicate(&self, msg: &Message) -> usize {
        if self.peers.is_empty() {
            return 0;
        }
        let futures = self.peers.iter().map(|peer| self.replicate_to(peer, msg));
        let results = futures_util::future::join_all(futures).await;
        results.into_iter().filter(|ok| *ok).count()
    }

    async fn replicate_to(&self, peer: &str, msg: &Message) -> bool {
        let url = format!("{}/_replicate", peer.trim_end_matches('/'));
        match self.http.post(&url).json(msg).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(peer = %peer, status = %resp.status(), "replication rejected by peer");
                false
            }
            Err(err) => {
                tracing::warn!(peer = %peer, ?err, "replication request failed");
                false
            }
        }
    }
}
