//! Rating scale queries

use dmat_common::db::RatingScaleEntry;
use dmat_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool};

/// Rating scale row ready for upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRatingScale {
    pub dimension_name: String,
    pub dimension_id: Option<i64>,
    pub level: u8,
    pub rating_name: String,
    pub description: String,
    pub business_relevance: Option<String>,
}

pub async fn upsert_rating_scale<'e, E>(executor: E, scale: &NewRatingScale, batch: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO rating_scales (
            dimension_name, dimension_id, level, rating_name,
            digital_maturity_description, business_relevance, import_batch
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(dimension_name, level) DO UPDATE SET
            dimension_id = excluded.dimension_id,
            rating_name = excluded.rating_name,
            digital_maturity_description = excluded.digital_maturity_description,
            business_relevance = excluded.business_relevance,
            import_batch = excluded.import_batch
        "#,
    )
    .bind(&scale.dimension_name)
    .bind(scale.dimension_id)
    .bind(scale.level as i64)
    .bind(&scale.rating_name)
    .bind(&scale.description)
    .bind(&scale.business_relevance)
    .bind(batch)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn remove_stale_rating_scales<'e, E>(executor: E, batch: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM rating_scales WHERE import_batch != ?")
        .bind(batch)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_rating_scales(pool: &SqlitePool) -> Result<Vec<RatingScaleEntry>> {
    let scales = sqlx::query_as::<_, RatingScaleEntry>(
        r#"
        SELECT id, dimension_name, dimension_id, level, rating_name,
               digital_maturity_description, business_relevance
        FROM rating_scales
        ORDER BY dimension_name, level
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(scales)
}

pub async fn list_for_dimension(pool: &SqlitePool, dimension_name: &str) -> Result<Vec<RatingScaleEntry>> {
    let scales = sqlx::query_as::<_, RatingScaleEntry>(
        r#"
        SELECT id, dimension_name, dimension_id, level, rating_name,
               digital_maturity_description, business_relevance
        FROM rating_scales
        WHERE dimension_name = ?
        ORDER BY level
        "#,
    )
    .bind(dimension_name)
    .fetch_all(pool)
    .await?;
    Ok(scales)
}
