//! Re-import endpoints
//!
//! Each endpoint runs one load against the configured workbooks. A missing
//! workbook is a 404; any other failure is a 500 and leaves the previous
//! data in place.

use axum::{extract::State, Json};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::import::{self, ImportKind, ImportOutcome, RefreshAllReport};
use crate::AppState;

async fn refresh(state: &AppState, kind: ImportKind) -> ApiResult<Json<ImportOutcome>> {
    let summary = import::loader::load(&state.db, &state.sources, kind)
        .await
        .map_err(ApiError::Import)?;

    let outcome = ImportOutcome::success(kind, summary);
    info!(kind = kind.key(), "{}", outcome.message);
    Ok(Json(outcome))
}

/// POST /api/mm/refresh-reports-data
pub async fn refresh_reports(State(state): State<AppState>) -> ApiResult<Json<ImportOutcome>> {
    refresh(&state, ImportKind::Reports).await
}

/// POST /api/mm/refresh-rating-scales
pub async fn refresh_rating_scales(State(state): State<AppState>) -> ApiResult<Json<ImportOutcome>> {
    refresh(&state, ImportKind::RatingScales).await
}

/// POST /api/mm/refresh-simulated-data
///
/// Reloads the global checksheet criteria.
pub async fn refresh_checksheet(State(state): State<AppState>) -> ApiResult<Json<ImportOutcome>> {
    refresh(&state, ImportKind::Checksheet).await
}

/// POST /api/mm/refresh-dimension-checksheet
pub async fn refresh_dimension_checksheet(
    State(state): State<AppState>,
) -> ApiResult<Json<ImportOutcome>> {
    refresh(&state, ImportKind::DimensionChecksheet).await
}

/// POST /api/mm/refresh-all-data
///
/// Always 200; failed loads are listed in `errors` with status
/// `partial_success`.
pub async fn refresh_all(State(state): State<AppState>) -> Json<RefreshAllReport> {
    Json(import::run_all(&state.db, &state.sources).await)
}
