//! Per-dimension results of an assessment

use dmat_common::db::DimensionAssessment;
use dmat_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool};

/// Record the calculated level; returns true when a row was created or its
/// level changed
pub async fn upsert_dimension_assessment<'e, E>(
    executor: E,
    assessment_id: i64,
    dimension_id: i64,
    level: i64,
    evidence: &str,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO dimension_assessments (assessment_id, dimension_id, current_level, evidence)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(assessment_id, dimension_id) DO UPDATE SET
            current_level = excluded.current_level,
            updated_at = CURRENT_TIMESTAMP
        WHERE dimension_assessments.current_level != excluded.current_level
        "#,
    )
    .bind(assessment_id)
    .bind(dimension_id)
    .bind(level)
    .bind(evidence)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_for_assessment(pool: &SqlitePool, assessment_id: i64) -> Result<Vec<DimensionAssessment>> {
    let rows = sqlx::query_as::<_, DimensionAssessment>(
        r#"
        SELECT id, assessment_id, dimension_id, current_level, evidence, updated_at
        FROM dimension_assessments
        WHERE assessment_id = ?
        ORDER BY dimension_id
        "#,
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
