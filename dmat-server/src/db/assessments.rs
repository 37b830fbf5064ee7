//! Assessment queries

use dmat_common::db::Assessment;
use dmat_common::Result;
use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqlitePool};

/// Assessment fields accepted on create and update
///
/// On update every `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentInput {
    pub plant_name: Option<String>,
    pub shop_unit: Option<String>,
    pub dimension_id: Option<i64>,
    pub assessor_name: Option<String>,
    pub notes: Option<String>,
    pub level1_notes: Option<String>,
    pub level2_notes: Option<String>,
    pub level3_notes: Option<String>,
    pub level4_notes: Option<String>,
    pub level5_notes: Option<String>,
    pub level1_image: Option<String>,
    pub level2_image: Option<String>,
    pub level3_image: Option<String>,
    pub level4_image: Option<String>,
    pub level5_image: Option<String>,
    pub overall_count: Option<i64>,
    pub checked_count: Option<i64>,
}

const SELECT_ASSESSMENT: &str = r#"
    SELECT id, area_id, dimension_id, plant_name, shop_unit, assessor_name, notes,
           level1_notes, level2_notes, level3_notes, level4_notes, level5_notes,
           level1_image, level2_image, level3_image, level4_image, level5_image,
           overall_count, checked_count, assessment_date, created_at, updated_at
    FROM assessments
"#;

pub async fn create_assessment<'e, E>(executor: E, area_id: i64, input: &AssessmentInput) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO assessments (
            area_id, dimension_id, plant_name, shop_unit, assessor_name, notes,
            level1_notes, level2_notes, level3_notes, level4_notes, level5_notes,
            level1_image, level2_image, level3_image, level4_image, level5_image,
            overall_count, checked_count
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(area_id)
    .bind(input.dimension_id)
    .bind(&input.plant_name)
    .bind(&input.shop_unit)
    .bind(&input.assessor_name)
    .bind(&input.notes)
    .bind(&input.level1_notes)
    .bind(&input.level2_notes)
    .bind(&input.level3_notes)
    .bind(&input.level4_notes)
    .bind(&input.level5_notes)
    .bind(&input.level1_image)
    .bind(&input.level2_image)
    .bind(&input.level3_image)
    .bind(&input.level4_image)
    .bind(&input.level5_image)
    .bind(input.overall_count.unwrap_or(0))
    .bind(input.checked_count.unwrap_or(0))
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_assessment<'e, E>(executor: E, id: i64) -> Result<Option<Assessment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", SELECT_ASSESSMENT);
    let assessment = sqlx::query_as::<_, Assessment>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(assessment)
}

/// Newest first
pub async fn list_assessments(pool: &SqlitePool) -> Result<Vec<Assessment>> {
    let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_ASSESSMENT);
    let assessments = sqlx::query_as::<_, Assessment>(&sql).fetch_all(pool).await?;
    Ok(assessments)
}

/// Apply the provided fields; returns false when the assessment is missing
///
/// A new dimension also moves the assessment to that dimension's area.
pub async fn update_assessment<'e, E>(executor: E, id: i64, input: &AssessmentInput) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE assessments SET
            plant_name = COALESCE(?, plant_name),
            shop_unit = COALESCE(?, shop_unit),
            dimension_id = COALESCE(?, dimension_id),
            area_id = COALESCE((SELECT area_id FROM dimensions WHERE id = ?), area_id),
            assessor_name = COALESCE(?, assessor_name),
            notes = COALESCE(?, notes),
            level1_notes = COALESCE(?, level1_notes),
            level2_notes = COALESCE(?, level2_notes),
            level3_notes = COALESCE(?, level3_notes),
            level4_notes = COALESCE(?, level4_notes),
            level5_notes = COALESCE(?, level5_notes),
            level1_image = COALESCE(?, level1_image),
            level2_image = COALESCE(?, level2_image),
            level3_image = COALESCE(?, level3_image),
            level4_image = COALESCE(?, level4_image),
            level5_image = COALESCE(?, level5_image),
            overall_count = COALESCE(?, overall_count),
            checked_count = COALESCE(?, checked_count),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&input.plant_name)
    .bind(&input.shop_unit)
    .bind(input.dimension_id)
    .bind(input.dimension_id)
    .bind(&input.assessor_name)
    .bind(&input.notes)
    .bind(&input.level1_notes)
    .bind(&input.level2_notes)
    .bind(&input.level3_notes)
    .bind(&input.level4_notes)
    .bind(&input.level5_notes)
    .bind(&input.level1_image)
    .bind(&input.level2_image)
    .bind(&input.level3_image)
    .bind(&input.level4_image)
    .bind(&input.level5_image)
    .bind(input.overall_count)
    .bind(input.checked_count)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
