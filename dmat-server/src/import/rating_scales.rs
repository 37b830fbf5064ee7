//! Rating scale loader
//!
//! The `RatingScales` tab lays dimensions across and levels down. A
//! dimension heading may span several columns (rating name, description,
//! business relevance); the heading is carried forward across the blank
//! header cells of its span.

use std::collections::BTreeMap;
use std::path::Path;

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::grid::{read_sheet_blocking, Grid};
use super::layout::RatingScaleLayout;
use super::loader::LoadSummary;
use super::ImportError;
use crate::db::rating_scales::{remove_stale_rating_scales, upsert_rating_scale, NewRatingScale};
use crate::db::{dimensions, new_import_batch};

/// Columns belonging to one dimension heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSpan {
    pub name: String,
    pub columns: Vec<usize>,
}

/// Group header columns into dimension spans, in order of first appearance
pub fn dimension_spans(grid: &Grid, layout: &RatingScaleLayout) -> Vec<DimensionSpan> {
    let mut spans: Vec<DimensionSpan> = Vec::new();
    let mut current: Option<usize> = None;

    for column in 0..grid.width() {
        if column == layout.level_column {
            current = None;
            continue;
        }

        let heading = grid.text(layout.header_row, column);
        if !heading.is_empty() {
            let idx = match spans.iter().position(|s| s.name == heading) {
                Some(idx) => idx,
                None => {
                    spans.push(DimensionSpan {
                        name: heading,
                        columns: Vec::new(),
                    });
                    spans.len() - 1
                }
            };
            current = Some(idx);
        }

        if let Some(idx) = current {
            spans[idx].columns.push(column);
        }
    }

    spans
}

/// Rating scale content for one (dimension, level) before id resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingScaleRecord {
    pub dimension_name: String,
    pub level: u8,
    pub rating_name: String,
    pub description: String,
    pub business_relevance: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RatingScaleSet {
    pub records: Vec<RatingScaleRecord>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

fn has_dash(text: &str) -> bool {
    text.contains('–') || text.contains('-')
}

/// Merge the content cells of one span on one level row
///
/// A cell with a dash ("1 – Manual logging") names the rating; the next
/// cell, if longer, describes it. Without a dash the rating is called
/// "Level N" and the first cell is the description. A further cell is the
/// business relevance.
fn merge_cells(level: u8, cells: &[String]) -> Option<(String, String, Option<String>)> {
    if cells.is_empty() {
        return None;
    }

    let (rating_name, description, next) = match cells.iter().position(|c| has_dash(c)) {
        Some(i) => {
            let name = cells[i].clone();
            match cells.get(i + 1) {
                Some(longer) if longer.chars().count() > name.chars().count() => {
                    (name, longer.clone(), i + 2)
                }
                _ => (name.clone(), name, i + 1),
            }
        }
        None => (format!("Level {}", level), cells[0].clone(), 1),
    };

    Some((rating_name, description, cells.get(next).cloned()))
}

/// Extract one record per (dimension, level) from the sheet
pub fn build_rating_scales(grid: &Grid, layout: &RatingScaleLayout) -> RatingScaleSet {
    let spans = dimension_spans(grid, layout);
    let mut set = RatingScaleSet::default();
    let mut index: BTreeMap<(String, u8), usize> = BTreeMap::new();

    let end = layout.end_row.min(grid.height());
    for row in layout.first_row..end {
        let level_text = grid.text(row, layout.level_column);
        if level_text.is_empty() {
            continue;
        }
        let Some(level) = layout.level_of(&level_text).filter(|l| (1..=5).contains(l)) else {
            let message = format!("row {}: no level in '{}'", row + 1, level_text);
            warn!("{}", message);
            set.skipped += 1;
            set.warnings.push(message);
            continue;
        };

        for span in &spans {
            let cells: Vec<String> = span
                .columns
                .iter()
                .map(|&col| grid.text(row, col))
                .filter(|text| !text.is_empty() && !layout.is_ignored(text))
                .collect();

            let Some((rating_name, description, business_relevance)) = merge_cells(level, &cells) else {
                continue;
            };

            let record = RatingScaleRecord {
                dimension_name: span.name.clone(),
                level,
                rating_name,
                description,
                business_relevance,
            };

            let key = (span.name.clone(), level);
            match index.get(&key) {
                Some(&idx) => {
                    let message = format!(
                        "row {}: second level {} entry for '{}' replaces the first",
                        row + 1,
                        level,
                        span.name
                    );
                    warn!("{}", message);
                    set.warnings.push(message);
                    set.records[idx] = record;
                }
                None => {
                    index.insert(key, set.records.len());
                    set.records.push(record);
                }
            }
        }
    }

    set
}

/// Replace the rating scale table
pub async fn load_rating_scales(
    pool: &SqlitePool,
    path: &Path,
    layout: &RatingScaleLayout,
) -> Result<LoadSummary, ImportError> {
    info!(path = %path.display(), sheet = %layout.sheet, "Loading rating scales");

    let grid = read_sheet_blocking(path, &layout.sheet).await?;
    let set = build_rating_scales(&grid, layout);

    let mut summary = LoadSummary {
        skipped: set.skipped,
        warnings: set.warnings.clone(),
        ..LoadSummary::default()
    };

    let batch = new_import_batch();
    let mut tx = pool.begin().await?;
    let mut resolved: BTreeMap<String, Option<i64>> = BTreeMap::new();

    for record in &set.records {
        let dimension_id = match resolved.get(&record.dimension_name) {
            Some(id) => *id,
            None => {
                let id = dimensions::find_id_by_name(&mut *tx, &record.dimension_name).await?;
                if id.is_none() {
                    let message = format!(
                        "rating scale dimension '{}' has no matching dimension",
                        record.dimension_name
                    );
                    warn!("{}", message);
                    summary.warnings.push(message);
                }
                resolved.insert(record.dimension_name.clone(), id);
                id
            }
        };

        let scale = NewRatingScale {
            dimension_name: record.dimension_name.clone(),
            dimension_id,
            level: record.level,
            rating_name: record.rating_name.clone(),
            description: record.description.clone(),
            business_relevance: record.business_relevance.clone(),
        };
        upsert_rating_scale(&mut *tx, &scale, &batch).await?;

        summary.records_written += 1;
        *summary.per_level.entry(record.level).or_insert(0) += 1;
        *summary.per_group.entry(record.dimension_name.clone()).or_insert(0) += 1;
    }

    summary.removed = remove_stale_rating_scales(&mut *tx, &batch).await?;
    tx.commit().await?;

    info!(
        records = summary.records_written,
        dimensions = summary.per_group.len(),
        removed = summary.removed,
        "Rating scales loaded"
    );
    Ok(summary)
}
