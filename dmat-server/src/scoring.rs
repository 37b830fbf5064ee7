//! Dimension score calculation from checksheet selections

use dmat_common::db::Dimension;
use dmat_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{assessments, dimension_assessments, dimensions, selections};

/// Achieved maturity level for a set of selected criterion levels
///
/// Currently the highest level with at least one selected criterion. This
/// does not check that every criterion of the lower levels is met.
pub fn achieved_level<I>(levels: I) -> Option<u8>
where
    I: IntoIterator<Item = i64>,
{
    levels
        .into_iter()
        .filter(|l| (1..=5).contains(l))
        .max()
        .map(|l| l as u8)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// "success", or "info" when nothing is selected yet
    pub status: String,
    pub message: String,
    pub assessment_id: i64,
    pub selected_count: usize,
    pub calculated_level: u8,
    pub dimensions_updated: usize,
}

/// Recalculate and store the dimension levels of an assessment
///
/// Applies to the assessment's own dimension when it has one, otherwise to
/// every dimension of its area (or every dimension at all when the area has
/// none). Writes happen in one transaction.
pub async fn calculate_dimension_scores(pool: &SqlitePool, assessment_id: i64) -> Result<ScoreReport> {
    let mut tx = pool.begin().await?;

    let assessment = assessments::get_assessment(&mut *tx, assessment_id)
        .await?
        .ok_or_else(|| Error::not_found("Assessment", assessment_id))?;

    let levels = selections::selected_levels(&mut *tx, assessment_id).await?;
    let selected_count = levels.len();

    let Some(level) = achieved_level(levels) else {
        return Ok(ScoreReport {
            status: "info".to_string(),
            message: "No capabilities selected yet".to_string(),
            assessment_id,
            selected_count: 0,
            calculated_level: 0,
            dimensions_updated: 0,
        });
    };

    let targets: Vec<Dimension> = match assessment.dimension_id {
        Some(dimension_id) => dimensions::get_dimension(&mut *tx, dimension_id)
            .await?
            .into_iter()
            .collect(),
        None => {
            let in_area = dimensions::list_by_area(&mut *tx, assessment.area_id).await?;
            if in_area.is_empty() {
                dimensions::list_dimensions(&mut *tx).await?
            } else {
                in_area
            }
        }
    };

    let evidence = format!("Calculated from checksheet selections (Level {})", level);
    let mut updated = 0;
    for dimension in &targets {
        if dimension_assessments::upsert_dimension_assessment(
            &mut *tx,
            assessment_id,
            dimension.id,
            level as i64,
            &evidence,
        )
        .await?
        {
            updated += 1;
        }
        dimensions::set_current_level(&mut *tx, dimension.id, level as i64).await?;
    }

    tx.commit().await?;

    info!(
        assessment_id,
        selected = selected_count,
        level,
        dimensions = targets.len(),
        updated,
        "Dimension scores calculated"
    );

    Ok(ScoreReport {
        status: "success".to_string(),
        message: format!(
            "Calculated dimension scores based on {} selected capabilities",
            selected_count
        ),
        assessment_id,
        selected_count,
        calculated_level: level,
        dimensions_updated: updated,
    })
}
