use crate::client::IngestDispatcher;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub providers: Vec<String>,
    pub records: u64,
    pub batches: u64,
}

/// Report service liveness along with store statistics
pub async fn health_handler(
    State(dispatcher): State<Arc<IngestDispatcher>>,
) -> (StatusCode, Json<HealthStatus>) {
    let repository = dispatcher.repository();
    let healthy = repository.health_check().await;
    if !healthy {
        warn!("Repository {} failed its health check", repository.name());
    }
    let stats = repository.stats().await;

    let health = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: dispatcher.providers(),
        records: stats.total_entities,
        batches: stats.batches,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}
