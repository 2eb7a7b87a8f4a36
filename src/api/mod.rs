pub mod routes;

use std::sync::Arc;

use crate::broker::Broker;
use crate::idempotency::IdempotencyStore;
use crate::kafka_client::KafkaClient;
use crate::metrics::MetricsEngine;
use crate::producer::Producer;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub producer: Arc<Producer>,
    pub metrics: Arc<MetricsEngine>,
    pub idempotency: Arc<IdempotencyStore>,
    pub kafka: Arc<KafkaClient>,
}

pub fn router(state: AppState) -> axum::Router {
    routes::router(state)
}
