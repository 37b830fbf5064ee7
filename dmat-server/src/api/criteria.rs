//! Maturity criteria, sections and rating scales

use axum::{
    extract::{Path, Query, State},
    Json,
};
use dmat_common::db::{CriterionKind, MaturityCriterion, MaturitySection, RatingScaleEntry};
use serde::{Deserialize, Serialize};

use crate::db::{criteria, rating_scales};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DimensionFilter {
    pub dimension_id: Option<i64>,
}

/// Criterion row tagged with its role
#[derive(Debug, Serialize)]
pub struct CriterionView {
    #[serde(flatten)]
    pub criterion: MaturityCriterion,
    pub kind: CriterionKind,
}

impl From<MaturityCriterion> for CriterionView {
    fn from(criterion: MaturityCriterion) -> Self {
        let kind = criterion.kind();
        Self { criterion, kind }
    }
}

/// GET /api/mm/maturity-levels?dimension_id=
pub async fn list_maturity_levels(
    State(state): State<AppState>,
    Query(filter): Query<DimensionFilter>,
) -> ApiResult<Json<Vec<CriterionView>>> {
    let criteria = criteria::list_criteria(&state.db, filter.dimension_id).await?;
    Ok(Json(criteria.into_iter().map(CriterionView::from).collect()))
}

/// GET /api/mm/maturity-sections?dimension_id=
pub async fn list_maturity_sections(
    State(state): State<AppState>,
    Query(filter): Query<DimensionFilter>,
) -> ApiResult<Json<Vec<MaturitySection>>> {
    Ok(Json(criteria::list_sections(&state.db, filter.dimension_id).await?))
}

/// GET /api/mm/rating-scales
pub async fn list_rating_scales(State(state): State<AppState>) -> ApiResult<Json<Vec<RatingScaleEntry>>> {
    Ok(Json(rating_scales::list_rating_scales(&state.db).await?))
}

/// GET /api/mm/rating-scales/:dimension_name
pub async fn rating_scales_for_dimension(
    State(state): State<AppState>,
    Path(dimension_name): Path<String>,
) -> ApiResult<Json<Vec<RatingScaleEntry>>> {
    let scales = rating_scales::list_for_dimension(&state.db, &dimension_name).await?;
    if scales.is_empty() {
        return Err(ApiError::NotFound(
            "Rating scales not found for this dimension".to_string(),
        ));
    }
    Ok(Json(scales))
}
