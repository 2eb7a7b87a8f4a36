use serde::{Deserialize, Serialize};

/// A single unit of work flowing through the broker. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub payload: String,
    pub timestamp: u64,
    pub key: Option<String>,
    pub sequence: Option<u64>,
}

impl Message {
    pub fn new(id: String, payload: String, timestamp: u64, key: Option<String>, sequence: Option<u64>) -> Self {
        Self { id, payload, timestamp, key, sequence }
    }
}
