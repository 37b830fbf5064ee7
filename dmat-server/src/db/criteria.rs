//! Maturity criteria and section headings
//!
//! Rows are keyed by (scope_key, sub_level) for criteria and
//! (scope_key, level) for sections. Imports upsert on that key and then
//! sweep what the current batch did not touch, so ids stay stable across
//! identical reloads.

use dmat_common::db::{MaturityCriterion, MaturitySection};
use dmat_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

use crate::import::records::{NewCriterion, NewSection, Scope};

/// Rows a load replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceScope {
    /// The dimension-less checksheet
    Global,
    /// Every per-dimension list at once
    AllDimensions,
    Dimension(i64),
}

impl ReplaceScope {
    /// SQL predicate on `scope_key` and its bound value
    fn predicate(&self) -> (&'static str, String) {
        match self {
            ReplaceScope::Global => ("scope_key = ?", Scope::Global.key()),
            ReplaceScope::AllDimensions => ("scope_key LIKE ?", "dimension:%".to_string()),
            ReplaceScope::Dimension(id) => ("scope_key = ?", Scope::Dimension(*id).key()),
        }
    }
}

pub async fn upsert_criterion(
    tx: &mut Transaction<'_, Sqlite>,
    scope: Scope,
    criterion: &NewCriterion,
    batch: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO maturity_levels (
            dimension_id, scope_key, level, name, sub_level, category,
            description, score, evidence, import_batch
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(scope_key, sub_level) DO UPDATE SET
            dimension_id = excluded.dimension_id,
            level = excluded.level,
            name = excluded.name,
            category = excluded.category,
            description = excluded.description,
            score = excluded.score,
            evidence = excluded.evidence,
            import_batch = excluded.import_batch
        "#,
    )
    .bind(scope.dimension_id())
    .bind(scope.key())
    .bind(criterion.level as i64)
    .bind(&criterion.name)
    .bind(&criterion.sub_level)
    .bind(&criterion.category)
    .bind(&criterion.description)
    .bind(criterion.score)
    .bind(&criterion.evidence)
    .bind(batch)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn upsert_section(
    tx: &mut Transaction<'_, Sqlite>,
    scope: Scope,
    section: &NewSection,
    batch: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO maturity_sections (dimension_id, scope_key, level, name, import_batch)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(scope_key, level) DO UPDATE SET
            dimension_id = excluded.dimension_id,
            name = excluded.name,
            import_batch = excluded.import_batch
        "#,
    )
    .bind(scope.dimension_id())
    .bind(scope.key())
    .bind(section.level as i64)
    .bind(&section.name)
    .bind(batch)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Delete criteria and sections in `scope` not written by `batch`
///
/// Returns the number of criteria removed.
pub async fn remove_stale(
    tx: &mut Transaction<'_, Sqlite>,
    scope: ReplaceScope,
    batch: &str,
) -> Result<u64> {
    let (predicate, key) = scope.predicate();

    let removed = sqlx::query(&format!(
        "DELETE FROM maturity_levels WHERE {} AND import_batch != ?",
        predicate
    ))
    .bind(&key)
    .bind(batch)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    sqlx::query(&format!(
        "DELETE FROM maturity_sections WHERE {} AND import_batch != ?",
        predicate
    ))
    .bind(&key)
    .bind(batch)
    .execute(&mut **tx)
    .await?;

    Ok(removed)
}

/// Criteria in a scope
pub async fn count_in_scope<'e, E>(executor: E, scope: ReplaceScope) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (predicate, key) = scope.predicate();
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM maturity_levels WHERE {}",
        predicate
    ))
    .bind(key)
    .fetch_one(executor)
    .await?;
    Ok(count)
}

pub async fn criterion_exists<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM maturity_levels WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

/// Criteria ordered by level and code, optionally for one dimension
pub async fn list_criteria(
    pool: &SqlitePool,
    dimension_id: Option<i64>,
) -> Result<Vec<MaturityCriterion>> {
    let criteria = sqlx::query_as::<_, MaturityCriterion>(
        r#"
        SELECT id, dimension_id, level, name, sub_level, category, description, score, evidence
        FROM maturity_levels
        WHERE ?1 IS NULL OR dimension_id = ?1
        ORDER BY level, sub_level, id
        "#,
    )
    .bind(dimension_id)
    .fetch_all(pool)
    .await?;
    Ok(criteria)
}

pub async fn list_sections(
    pool: &SqlitePool,
    dimension_id: Option<i64>,
) -> Result<Vec<MaturitySection>> {
    let sections = sqlx::query_as::<_, MaturitySection>(
        r#"
        SELECT id, dimension_id, level, name
        FROM maturity_sections
        WHERE ?1 IS NULL OR dimension_id = ?1
        ORDER BY dimension_id, level
        "#,
    )
    .bind(dimension_id)
    .fetch_all(pool)
    .await?;
    Ok(sections)
}
