use crate::metrics::MetricsSnapshot;

/// Contract-only stand-in for the external log-broker client used in the A/B
/// comparison surface named by spec §1. Reimplementing a Kafka client is an
/// explicit Non-goal; this exists only so `/metrics` can report a `kafka`
/// field in the same DTO shape as `mymq` per spec §6.
pub struct KafkaClient;

impl KafkaClient {
    pub fn new() -> Self {
        Self
    }

    /// A real deployment wires this to an actual Kafka producer/consumer and
    /// its own metrics. Absent that external system, an untouched snapshot
    /// communicates "not wired up" without fabricating throughput numbers.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}

impl Default for KafkaClient {
    fn default() -> Self {
        Self::new()
    }
}
