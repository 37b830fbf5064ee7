//! Service status and health check endpoints

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// GET / response
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub git_hash: String,
    pub endpoints: Vec<&'static str>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub timestamp: String,
}

/// GET /
pub async fn service_status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "online".to_string(),
        service: "Digital Maturity Assessment API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        endpoints: vec![
            "/api/mm/areas",
            "/api/mm/dimensions",
            "/api/mm/maturity-levels",
            "/api/mm/rating-scales",
            "/api/mm/assessments",
            "/api/mm/checksheet-selections",
            "/api/mm/reports/summary",
            "/api/mm/refresh-all-data",
        ],
    })
}

/// GET /health
///
/// No database access, so it answers even while an import holds the write lock.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "dmat-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Build status and health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_status))
        .route("/health", get(health_check))
}
