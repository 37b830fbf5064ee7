//! Assessments, checksheet selections and score calculation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dmat_common::db::{Assessment, ChecksheetSelection, DimensionAssessment};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{areas, assessments, criteria, dimension_assessments, dimensions, selections};
use crate::db::assessments::AssessmentInput;
use crate::db::selections::SelectionInput;
use crate::error::{ApiError, ApiResult};
use crate::scoring::{self, ScoreReport};
use crate::AppState;

/// POST /api/mm/assessments
///
/// The assessment belongs to the area of its dimension, or to the first
/// area when no dimension is given.
pub async fn create_assessment(
    State(state): State<AppState>,
    Json(input): Json<AssessmentInput>,
) -> ApiResult<(StatusCode, Json<Assessment>)> {
    let area_id = match input.dimension_id {
        Some(dimension_id) => {
            dimensions::get_dimension(&state.db, dimension_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Dimension not found".to_string()))?
                .area_id
        }
        None => {
            areas::first_area(&state.db)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound("No areas found. Please load data first.".to_string())
                })?
                .id
        }
    };

    let id = assessments::create_assessment(&state.db, area_id, &input).await?;
    let assessment = assessments::get_assessment(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Assessment {} vanished after insert", id)))?;

    info!(assessment_id = id, area_id, dimension_id = ?input.dimension_id, "Assessment created");

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /api/mm/assessments
pub async fn list_assessments(State(state): State<AppState>) -> ApiResult<Json<Vec<Assessment>>> {
    Ok(Json(assessments::list_assessments(&state.db).await?))
}

/// Assessment with its calculated dimension levels
#[derive(Debug, Serialize)]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub dimension_results: Vec<DimensionAssessment>,
}

/// GET /api/mm/assessments/:id
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AssessmentDetail>> {
    let assessment = assessments::get_assessment(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;
    let dimension_results = dimension_assessments::list_for_assessment(&state.db, id).await?;

    Ok(Json(AssessmentDetail {
        assessment,
        dimension_results,
    }))
}

/// PUT /api/mm/assessments/:id
///
/// Only the fields present in the body change.
pub async fn update_assessment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AssessmentInput>,
) -> ApiResult<Json<Assessment>> {
    if let Some(dimension_id) = input.dimension_id {
        if dimensions::get_dimension(&state.db, dimension_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown dimension {}", dimension_id)));
        }
    }

    if !assessments::update_assessment(&state.db, id, &input).await? {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    }

    let assessment = assessments::get_assessment(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;
    Ok(Json(assessment))
}

#[derive(Debug, Serialize)]
pub struct SelectionsSaved {
    pub status: String,
    pub message: String,
    pub count: usize,
}

/// POST /api/mm/checksheet-selections
///
/// Body is a JSON array; all entries are written in one transaction. An
/// entry naming a missing assessment or criterion rejects the whole batch.
pub async fn save_selections(
    State(state): State<AppState>,
    Json(batch): Json<Vec<SelectionInput>>,
) -> ApiResult<Json<SelectionsSaved>> {
    let mut tx = state.db.begin().await?;

    for (index, selection) in batch.iter().enumerate() {
        let assessment_id = selection.assessment_id.ok_or_else(|| {
            ApiError::BadRequest(format!("Selection {} has no assessment_id", index))
        })?;
        if assessments::get_assessment(&mut *tx, assessment_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Selection {} refers to unknown assessment {}",
                index, assessment_id
            )));
        }
        if !criteria::criterion_exists(&mut *tx, selection.maturity_level_id).await? {
            return Err(ApiError::BadRequest(format!(
                "Selection {} refers to unknown maturity level {}",
                index, selection.maturity_level_id
            )));
        }
        selections::upsert_selection(&mut *tx, assessment_id, selection).await?;
    }

    tx.commit().await?;

    info!(count = batch.len(), "Checksheet selections saved");

    Ok(Json(SelectionsSaved {
        status: "success".to_string(),
        message: format!("Saved {} selections", batch.len()),
        count: batch.len(),
    }))
}

/// GET /api/mm/checksheet-selections
pub async fn list_selections(State(state): State<AppState>) -> ApiResult<Json<Vec<ChecksheetSelection>>> {
    Ok(Json(selections::list_selections(&state.db).await?))
}

/// GET /api/mm/checksheet-selections/:assessment_id
pub async fn selections_for_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<i64>,
) -> ApiResult<Json<Vec<ChecksheetSelection>>> {
    Ok(Json(selections::list_for_assessment(&state.db, assessment_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub assessment_id: i64,
}

/// POST /api/mm/calculate-dimension-scores?assessment_id=
pub async fn calculate_dimension_scores(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
) -> ApiResult<Json<ScoreReport>> {
    let report = scoring::calculate_dimension_scores(&state.db, query.assessment_id).await?;
    Ok(Json(report))
}
