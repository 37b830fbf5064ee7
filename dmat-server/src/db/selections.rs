//! Checksheet selection queries

use dmat_common::db::ChecksheetSelection;
use dmat_common::Result;
use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqlitePool};

/// One tick-box state posted by the checksheet UI
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionInput {
    pub assessment_id: Option<i64>,
    pub maturity_level_id: i64,
    pub is_selected: bool,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Insert or update by (assessment, criterion)
pub async fn upsert_selection<'e, E>(
    executor: E,
    assessment_id: i64,
    selection: &SelectionInput,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO checksheet_selections (assessment_id, maturity_level_id, is_selected, evidence)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(assessment_id, maturity_level_id) DO UPDATE SET
            is_selected = excluded.is_selected,
            evidence = excluded.evidence,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(assessment_id)
    .bind(selection.maturity_level_id)
    .bind(selection.is_selected)
    .bind(&selection.evidence)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_selections(pool: &SqlitePool) -> Result<Vec<ChecksheetSelection>> {
    let selections = sqlx::query_as::<_, ChecksheetSelection>(
        r#"
        SELECT id, assessment_id, maturity_level_id, is_selected, evidence, created_at, updated_at
        FROM checksheet_selections
        ORDER BY assessment_id, maturity_level_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(selections)
}

pub async fn list_for_assessment(pool: &SqlitePool, assessment_id: i64) -> Result<Vec<ChecksheetSelection>> {
    let selections = sqlx::query_as::<_, ChecksheetSelection>(
        r#"
        SELECT id, assessment_id, maturity_level_id, is_selected, evidence, created_at, updated_at
        FROM checksheet_selections
        WHERE assessment_id = ?
        ORDER BY maturity_level_id
        "#,
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await?;
    Ok(selections)
}

/// Levels of the criteria ticked in an assessment, one entry per selection
pub async fn selected_levels<'e, E>(executor: E, assessment_id: i64) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let levels = sqlx::query_scalar(
        r#"
        SELECT m.level
        FROM checksheet_selections s
        JOIN maturity_levels m ON m.id = s.maturity_level_id
        WHERE s.assessment_id = ? AND s.is_selected = 1
        "#,
    )
    .bind(assessment_id)
    .fetch_all(executor)
    .await?;
    Ok(levels)
}
