pub mod api;
pub mod broker;
pub mod config;
pub mod consumer;
pub mod dlq;
pub mod error;
pub mod idempotency;
pub mod kafka_client;
pub mod message;
pub mod metrics;
pub mod producer;
pub mod queue;
pub mod replication;
pub mod wal;
