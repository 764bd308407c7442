use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::HashMap;

use crate::server::HmsServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    /// Seconds since the server state was built
    pub uptime: u64,
    pub backend: database_layer::Backend,
    pub checks: HashMap<String, String>,
}

/// Health check handler, 503 when the store does not answer
pub async fn health_check(State(server): State<HmsServer>) -> (StatusCode, Json<HealthResponse>) {
    let database_healthy = server.repos.is_healthy().await;

    let mut checks = HashMap::new();
    checks.insert(
        "database".to_string(),
        if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );

    let now = chrono::Utc::now();
    let uptime = u64::try_from((now - server.started_at).num_seconds()).unwrap_or(0);

    let (status_code, status) = if database_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: now.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
        backend: server.repos.backend(),
        checks,
    };

    (status_code, Json(response))
}
