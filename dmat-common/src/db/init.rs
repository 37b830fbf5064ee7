//! Database initialization
//!
//! Opens (or creates) the SQLite database and brings the schema up to date.
//! Every statement is `CREATE ... IF NOT EXISTS`, so initialization is safe
//! to repeat on each startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open the database file, creating it and its parent folder if missing
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas are set through connect options so that every pooled
    // connection gets them, not only the first one.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool is pinned to one connection that never expires: every SQLite
/// `:memory:` connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_areas_table(pool).await?;
    create_dimensions_table(pool).await?;
    create_maturity_levels_table(pool).await?;
    create_maturity_sections_table(pool).await?;
    create_rating_scales_table(pool).await?;
    create_assessments_table(pool).await?;
    create_checksheet_selections_table(pool).await?;
    create_dimension_assessments_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    info!("Database schema ready (v{})", SCHEMA_VERSION);
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_areas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS areas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            desired_level INTEGER CHECK (desired_level BETWEEN 1 AND 5),
            import_batch TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_dimensions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dimensions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            area_id INTEGER NOT NULL REFERENCES areas(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            current_level INTEGER NOT NULL DEFAULT 1 CHECK (current_level BETWEEN 0 AND 5),
            desired_level INTEGER NOT NULL DEFAULT 3 CHECK (desired_level BETWEEN 1 AND 5),
            import_batch TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (area_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dimensions_name ON dimensions(name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Category and leaf rows of a checksheet
///
/// `scope_key` is "global" for the plain checksheet and "dimension:<id>"
/// for per-dimension sheets; together with `sub_level` it is the natural key.
async fn create_maturity_levels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maturity_levels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dimension_id INTEGER REFERENCES dimensions(id) ON DELETE CASCADE,
            scope_key TEXT NOT NULL,
            level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 5),
            name TEXT NOT NULL,
            sub_level TEXT NOT NULL,
            category TEXT,
            description TEXT NOT NULL,
            score REAL,
            evidence TEXT,
            import_batch TEXT NOT NULL,
            UNIQUE (scope_key, sub_level)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_maturity_levels_dimension ON maturity_levels(dimension_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_maturity_sections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maturity_sections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dimension_id INTEGER REFERENCES dimensions(id) ON DELETE CASCADE,
            scope_key TEXT NOT NULL,
            level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 5),
            name TEXT NOT NULL,
            import_batch TEXT NOT NULL,
            UNIQUE (scope_key, level)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_rating_scales_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rating_scales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dimension_name TEXT NOT NULL,
            dimension_id INTEGER REFERENCES dimensions(id) ON DELETE SET NULL,
            level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 5),
            rating_name TEXT NOT NULL,
            digital_maturity_description TEXT NOT NULL,
            business_relevance TEXT,
            import_batch TEXT NOT NULL,
            UNIQUE (dimension_name, level)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_assessments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            area_id INTEGER NOT NULL REFERENCES areas(id) ON DELETE CASCADE,
            dimension_id INTEGER REFERENCES dimensions(id) ON DELETE SET NULL,
            plant_name TEXT,
            shop_unit TEXT,
            assessor_name TEXT,
            notes TEXT,
            level1_notes TEXT,
            level2_notes TEXT,
            level3_notes TEXT,
            level4_notes TEXT,
            level5_notes TEXT,
            level1_image TEXT,
            level2_image TEXT,
            level3_image TEXT,
            level4_image TEXT,
            level5_image TEXT,
            overall_count INTEGER NOT NULL DEFAULT 0,
            checked_count INTEGER NOT NULL DEFAULT 0,
            assessment_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_checksheet_selections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checksheet_selections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            assessment_id INTEGER NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
            maturity_level_id INTEGER NOT NULL REFERENCES maturity_levels(id) ON DELETE CASCADE,
            is_selected INTEGER NOT NULL DEFAULT 0,
            evidence TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (assessment_id, maturity_level_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_dimension_assessments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dimension_assessments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            assessment_id INTEGER NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
            dimension_id INTEGER NOT NULL REFERENCES dimensions(id) ON DELETE CASCADE,
            current_level INTEGER NOT NULL,
            evidence TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (assessment_id, dimension_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
