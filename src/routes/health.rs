use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub admin_log_enabled: bool,
}

/// Basic health check endpoint
///
/// Returns a simple health status indicating the service is running.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "admin-log".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        admin_log_enabled: state.admin_log.settings().enabled,
    })
}
