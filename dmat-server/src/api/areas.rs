//! Areas and dimensions

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{NaiveDateTime, Utc};
use dmat_common::db::{Area, Dimension};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{areas, dimensions};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Area with its dimensions
#[derive(Debug, Serialize)]
pub struct AreaWithDimensions {
    #[serde(flatten)]
    pub area: Area,
    pub dimensions: Vec<Dimension>,
}

/// GET /api/mm/areas
pub async fn list_areas(State(state): State<AppState>) -> ApiResult<Json<Vec<AreaWithDimensions>>> {
    let areas = areas::list_areas(&state.db).await?;
    let dims = dimensions::list_dimensions(&state.db).await?;

    let result = areas
        .into_iter()
        .map(|area| {
            let dimensions = dims.iter().filter(|d| d.area_id == area.id).cloned().collect();
            AreaWithDimensions { area, dimensions }
        })
        .collect();

    Ok(Json(result))
}

/// GET /api/mm/areas/:id
pub async fn get_area(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AreaWithDimensions>> {
    let area = areas::get_area(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Area not found".to_string()))?;
    let dimensions = dimensions::list_by_area(&state.db, id).await?;

    Ok(Json(AreaWithDimensions { area, dimensions }))
}

/// Dimension as listed for assessment filtering
#[derive(Debug, Serialize)]
pub struct DimensionSummary {
    pub id: i64,
    pub name: String,
    pub area_id: i64,
}

/// GET /api/mm/dimensions
pub async fn list_dimensions(State(state): State<AppState>) -> ApiResult<Json<Vec<DimensionSummary>>> {
    let dims = dimensions::list_dimensions(&state.db).await?;
    Ok(Json(
        dims.into_iter()
            .map(|d| DimensionSummary {
                id: d.id,
                name: d.name,
                area_id: d.area_id,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DimensionUpdate {
    pub current_level: i64,
    #[serde(default)]
    pub desired_level: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DimensionUpdated {
    pub status: String,
    pub dimension: Dimension,
}

fn check_level(field: &str, level: i64) -> ApiResult<()> {
    if (1..=5).contains(&level) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be between 1 and 5, got {}",
            field, level
        )))
    }
}

/// PUT /api/mm/dimensions/:id
pub async fn update_dimension(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<DimensionUpdate>,
) -> ApiResult<Json<DimensionUpdated>> {
    check_level("current_level", update.current_level)?;
    if let Some(desired) = update.desired_level {
        check_level("desired_level", desired)?;
    }

    if !dimensions::update_levels(&state.db, id, update.current_level, update.desired_level).await? {
        return Err(ApiError::NotFound("Dimension not found".to_string()));
    }

    let dimension = dimensions::get_dimension(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dimension not found".to_string()))?;

    info!(dimension_id = id, current = dimension.current_level, desired = dimension.desired_level, "Dimension updated");

    Ok(Json(DimensionUpdated {
        status: "success".to_string(),
        dimension,
    }))
}

#[derive(Debug, Serialize)]
pub struct SimulatedUpdate {
    pub status: String,
    pub dimension_id: i64,
    pub old_level: i64,
    pub new_level: i64,
    pub timestamp: NaiveDateTime,
}

/// POST /api/mm/simulate-update/:id
///
/// Moves the current level by -1, 0 or +1, clamped to 1..=5.
pub async fn simulate_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SimulatedUpdate>> {
    let dimension = dimensions::get_dimension(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dimension not found".to_string()))?;

    let change: i64 = rand::thread_rng().gen_range(-1..=1);
    let old_level = dimension.current_level;
    let new_level = (old_level + change).clamp(1, 5);

    dimensions::set_current_level(&state.db, id, new_level).await?;

    Ok(Json(SimulatedUpdate {
        status: "updated".to_string(),
        dimension_id: id,
        old_level,
        new_level,
        timestamp: Utc::now().naive_utc(),
    }))
}
