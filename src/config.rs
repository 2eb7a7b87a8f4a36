use std::env;

/// Process-wide configuration, assembled once at startup from the environment
/// and passed down by reference. Never re-read mid-run.
#[derive(Debug, Clone)]
pub struct Config {
    pub queue_size: usize,
    pub dlq_size: usize,
    pub poll_interval_ms: u64,
    pub wal_path: String,
    pub num_consumers: usize,
    pub node_id: String,
    pub peers: Vec<String>,
    pub quorum: usize,
    pub bind_addr: String,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let queue_size: usize = env_parsed("CUSTOM_MQ_QUEUE_SIZE", 10_000)
            .max(1);
        let dlq_size: usize = env_parsed("CUSTOM_MQ_DLQ_SIZE", 1_000)
            .max(1);
        let poll_interval_ms: u64 = env_parsed("CUSTOM_MQ_POLL_INTERVAL_MS", 100);
        let wal_path = env::var("CUSTOM_MQ_WAL_PATH")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "./mymq-wal.log".to_string());
        let num_consumers: usize = env_parsed("CUSTOM_MQ_NUM_CONSUMERS", 1usize).max(1);

        let node_id = env::var("CLUSTER_NODE_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "node-1".to_string());
        let peers: Vec<String> = env::var("CLUSTER_PEERS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let quorum: usize = env_parsed::<i64>("CLUSTER_QUORUM", 1).max(1) as usize;

        let bind_addr = env::var("MYMQ_BIND_ADDR")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        Self {
            queue_size,
            dlq_size,
            poll_interval_ms,
            wal_path,
            num_consumers,
            node_id,
            peers,
            quorum,
            bind_addr,
        }
    }
}
