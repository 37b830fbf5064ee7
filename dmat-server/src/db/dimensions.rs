//! Dimension queries

use dmat_common::db::Dimension;
use dmat_common::Result;
use sqlx::{Executor, Sqlite, Transaction};

pub async fn list_dimensions<'e, E>(executor: E) -> Result<Vec<Dimension>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let dimensions = sqlx::query_as::<_, Dimension>(
        r#"
        SELECT id, area_id, name, current_level, desired_level, created_at, updated_at
        FROM dimensions
        ORDER BY area_id, id
        "#,
    )
    .fetch_all(executor)
    .await?;
    Ok(dimensions)
}

pub async fn list_by_area<'e, E>(executor: E, area_id: i64) -> Result<Vec<Dimension>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let dimensions = sqlx::query_as::<_, Dimension>(
        r#"
        SELECT id, area_id, name, current_level, desired_level, created_at, updated_at
        FROM dimensions
        WHERE area_id = ?
        ORDER BY id
        "#,
    )
    .bind(area_id)
    .fetch_all(executor)
    .await?;
    Ok(dimensions)
}

pub async fn get_dimension<'e, E>(executor: E, id: i64) -> Result<Option<Dimension>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let dimension = sqlx::query_as::<_, Dimension>(
        r#"
        SELECT id, area_id, name, current_level, desired_level, created_at, updated_at
        FROM dimensions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(dimension)
}

/// Dimension id for an exact name; the lowest id wins when several areas
/// share the name
pub async fn find_id_by_name<'e, E>(executor: E, name: &str) -> Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar("SELECT id FROM dimensions WHERE name = ? ORDER BY id LIMIT 1")
        .bind(name)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

/// Outcome of `upsert_dimension`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionUpsert {
    pub id: i64,
    pub created: bool,
}

/// Insert a dimension under `area_id` or refresh it by (area, name)
///
/// `initial_level` only applies to new rows: an existing dimension keeps
/// its current level, which assessments and simulations may have moved.
pub async fn upsert_dimension(
    tx: &mut Transaction<'_, Sqlite>,
    area_id: i64,
    name: &str,
    desired_level: u8,
    initial_level: u8,
    batch: &str,
) -> Result<DimensionUpsert> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM dimensions WHERE area_id = ? AND name = ?")
            .bind(area_id)
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?;

    if let Some(id) = existing {
        sqlx::query(
            r#"
            UPDATE dimensions
            SET desired_level = ?, import_batch = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(desired_level as i64)
        .bind(batch)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        return Ok(DimensionUpsert { id, created: false });
    }

    let result = sqlx::query(
        r#"
        INSERT INTO dimensions (area_id, name, current_level, desired_level, import_batch)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(area_id)
    .bind(name)
    .bind(initial_level as i64)
    .bind(desired_level as i64)
    .bind(batch)
    .execute(&mut **tx)
    .await?;

    Ok(DimensionUpsert {
        id: result.last_insert_rowid(),
        created: true,
    })
}

/// Set current level and, when given, desired level
pub async fn update_levels<'e, E>(
    executor: E,
    id: i64,
    current_level: i64,
    desired_level: Option<i64>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE dimensions
        SET current_level = ?,
            desired_level = COALESCE(?, desired_level),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(current_level)
    .bind(desired_level)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Set current level; returns false when it already had that value
pub async fn set_current_level<'e, E>(executor: E, id: i64, level: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE dimensions
        SET current_level = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND current_level != ?
        "#,
    )
    .bind(level)
    .bind(id)
    .bind(level)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete dimensions not written by `batch`
pub async fn remove_stale_dimensions<'e, E>(executor: E, batch: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM dimensions WHERE import_batch IS NOT ?")
        .bind(batch)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
