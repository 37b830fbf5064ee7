//! Checksheet loaders
//!
//! `load_checksheet` fills the global criteria list from the `CheckSheet`
//! tab. `load_dimension_checksheet` fills one list per dimension column of
//! the `Smart Factory CheckSheet` tab. Both replace their scope wholesale
//! inside one transaction.

use std::collections::HashSet;
use std::path::Path;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use super::classify::{classify_rows, dimension_columns};
use super::grid::read_sheet_blocking;
use super::layout::{ChecksheetLayout, DimensionSheetLayout};
use super::loader::LoadSummary;
use super::records::{build_records, DescriptionColumn, RecordSet, Scope};
use super::ImportError;
use crate::db::criteria::{self, ReplaceScope};
use crate::db::{dimensions, new_import_batch};

async fn write_record_set(
    tx: &mut Transaction<'_, Sqlite>,
    set: &RecordSet,
    batch: &str,
) -> Result<(), ImportError> {
    for section in &set.sections {
        criteria::upsert_section(tx, set.scope, section, batch).await?;
    }
    for criterion in &set.criteria {
        criteria::upsert_criterion(tx, set.scope, criterion, batch).await?;
    }
    Ok(())
}

/// Replace the global criteria list
pub async fn load_checksheet(
    pool: &SqlitePool,
    path: &Path,
    layout: &ChecksheetLayout,
) -> Result<LoadSummary, ImportError> {
    info!(path = %path.display(), sheet = %layout.sheet, "Loading checksheet");

    let grid = read_sheet_blocking(path, &layout.sheet).await?;
    let classified = classify_rows(&grid, layout);
    let set = build_records(&classified.rows, Scope::Global, None);

    let batch = new_import_batch();
    let mut tx = pool.begin().await?;
    write_record_set(&mut tx, &set, &batch).await?;
    let removed = criteria::remove_stale(&mut tx, ReplaceScope::Global, &batch).await?;
    tx.commit().await?;

    let mut summary = LoadSummary {
        records_written: set.criteria.len(),
        removed,
        skipped: classified.skipped + set.skipped,
        per_level: set.per_level(),
        ..LoadSummary::default()
    };
    summary.warnings.extend(classified.warnings);
    summary.warnings.extend(set.warnings);

    info!(
        criteria = summary.records_written,
        sections = set.sections.len(),
        removed = summary.removed,
        skipped = summary.skipped,
        "Checksheet loaded"
    );
    Ok(summary)
}

/// Replace every per-dimension criteria list
///
/// Dimension names in the header row must match existing dimensions
/// exactly; a column whose name does not resolve is skipped with a warning
/// and contributes nothing.
pub async fn load_dimension_checksheet(
    pool: &SqlitePool,
    path: &Path,
    layout: &DimensionSheetLayout,
) -> Result<LoadSummary, ImportError> {
    info!(path = %path.display(), sheet = %layout.sheet, "Loading dimension checksheet");

    let grid = read_sheet_blocking(path, &layout.sheet).await?;
    let columns = dimension_columns(&grid, layout);
    let classified = classify_rows(&grid, &layout.as_checksheet());

    let mut summary = LoadSummary {
        skipped: classified.skipped,
        warnings: classified.warnings.clone(),
        ..LoadSummary::default()
    };

    let batch = new_import_batch();
    let mut tx = pool.begin().await?;
    let mut seen = HashSet::new();

    for column in &columns {
        let Some(dimension_id) = dimensions::find_id_by_name(&mut *tx, &column.name).await? else {
            let message = format!(
                "dimension '{}' (column {}) not found, column skipped",
                column.name, column.column
            );
            warn!("{}", message);
            summary.warnings.push(message);
            continue;
        };

        if !seen.insert(dimension_id) {
            let message = format!(
                "dimension '{}' appears in more than one column, column {} skipped",
                column.name, column.column
            );
            warn!("{}", message);
            summary.warnings.push(message);
            continue;
        }

        let description = DescriptionColumn {
            grid: &grid,
            column: column.column,
        };
        let set = build_records(&classified.rows, Scope::Dimension(dimension_id), Some(description));
        write_record_set(&mut tx, &set, &batch).await?;

        info!(
            dimension = %column.name,
            dimension_id,
            criteria = set.criteria.len(),
            "Dimension criteria written"
        );

        summary.records_written += set.criteria.len();
        summary.skipped += set.skipped;
        for (level, count) in set.per_level() {
            *summary.per_level.entry(level).or_insert(0) += count;
        }
        summary.per_group.insert(column.name.clone(), set.criteria.len());
        summary.warnings.extend(set.warnings);
    }

    summary.removed = criteria::remove_stale(&mut tx, ReplaceScope::AllDimensions, &batch).await?;
    tx.commit().await?;

    info!(
        criteria = summary.records_written,
        dimensions = summary.per_group.len(),
        removed = summary.removed,
        "Dimension checksheet loaded"
    );
    Ok(summary)
}
