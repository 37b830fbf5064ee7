//! Area queries

use dmat_common::db::Area;
use dmat_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

const AREA_COLUMNS: &str = "id, name, description, desired_level, created_at, updated_at";

pub async fn list_areas(pool: &SqlitePool) -> Result<Vec<Area>> {
    let areas = sqlx::query_as::<_, Area>(&format!("SELECT {} FROM areas ORDER BY id", AREA_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(areas)
}

pub async fn get_area<'e, E>(executor: E, id: i64) -> Result<Option<Area>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let area = sqlx::query_as::<_, Area>(&format!("SELECT {} FROM areas WHERE id = ?", AREA_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(area)
}

/// Lowest-id area, the default owner of new assessments
pub async fn first_area<'e, E>(executor: E) -> Result<Option<Area>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let area = sqlx::query_as::<_, Area>(&format!(
        "SELECT {} FROM areas ORDER BY id LIMIT 1",
        AREA_COLUMNS
    ))
    .fetch_optional(executor)
    .await?;
    Ok(area)
}

pub async fn count_areas<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas")
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Insert or refresh an area by name, returning its id
pub async fn upsert_area(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    description: &str,
    desired_level: u8,
    batch: &str,
) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM areas WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = existing {
        sqlx::query(
            r#"
            UPDATE areas
            SET description = ?, desired_level = ?, import_batch = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(description)
        .bind(desired_level as i64)
        .bind(batch)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO areas (name, description, desired_level, import_batch) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(desired_level as i64)
    .bind(batch)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Delete areas not written by `batch`; their dimensions cascade
pub async fn remove_stale_areas<'e, E>(executor: E, batch: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM areas WHERE import_batch IS NOT ?")
        .bind(batch)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
