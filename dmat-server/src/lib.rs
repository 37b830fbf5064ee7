//! dmat-server library - digital maturity assessment backend
//!
//! REST API over the maturity tables plus the spreadsheet import pipeline
//! that fills them.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod import;
pub mod scoring;

use import::ImportSources;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Workbooks and layouts used by the refresh endpoints
    pub sources: Arc<ImportSources>,
}

impl AppState {
    pub fn new(db: SqlitePool, sources: ImportSources) -> Self {
        Self {
            db,
            sources: Arc::new(sources),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let mm = Router::new()
        .route("/areas", get(api::list_areas))
        .route("/areas/:id", get(api::get_area))
        .route("/dimensions", get(api::list_dimensions))
        .route("/dimensions/:id", put(api::update_dimension))
        .route("/simulate-update/:id", post(api::simulate_update))
        .route("/maturity-levels", get(api::list_maturity_levels))
        .route("/maturity-sections", get(api::list_maturity_sections))
        .route("/rating-scales", get(api::list_rating_scales))
        .route("/rating-scales/:dimension_name", get(api::rating_scales_for_dimension))
        .route(
            "/assessments",
            get(api::list_assessments).post(api::create_assessment),
        )
        .route(
            "/assessments/:id",
            get(api::get_assessment).put(api::update_assessment),
        )
        .route(
            "/checksheet-selections",
            get(api::list_selections).post(api::save_selections),
        )
        .route(
            "/checksheet-selections/:assessment_id",
            get(api::selections_for_assessment),
        )
        .route(
            "/calculate-dimension-scores",
            post(api::calculate_dimension_scores),
        )
        .route("/reports/summary", get(api::reports_summary))
        .route("/generate-report", post(api::generate_report))
        .route("/refresh-reports-data", post(api::refresh_reports))
        .route("/refresh-rating-scales", post(api::refresh_rating_scales))
        .route("/refresh-simulated-data", post(api::refresh_checksheet))
        .route(
            "/refresh-dimension-checksheet",
            post(api::refresh_dimension_checksheet),
        )
        .route("/refresh-all-data", post(api::refresh_all));

    Router::new()
        .nest("/api/mm", mm)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
