//! Areas and dimensions from the `Reports` tab
//!
//! A non-empty area cell opens a new area (its desired level read from the
//! same row); every dimension cell below it, up to the next area, belongs
//! to that area.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::grid::{read_sheet_blocking, Grid};
use super::layout::ReportsLayout;
use super::loader::LoadSummary;
use super::ImportError;
use crate::db::{areas, dimensions, new_import_batch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArea {
    pub name: String,
    pub desired_level: u8,
    pub dimensions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportsPlan {
    pub areas: Vec<PlannedArea>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ReportsPlan {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn dimension_count(&self) -> usize {
        self.areas.iter().map(|a| a.dimensions.len()).sum()
    }
}

fn desired_level(grid: &Grid, row: usize, layout: &ReportsLayout, plan: &mut ReportsPlan) -> u8 {
    let cell = grid.cell(row, layout.desired_level_column);
    if cell.is_empty() {
        return layout.default_desired_level;
    }
    match cell.as_f64().map(|v| v.trunc() as i64) {
        Some(level) if (1..=5).contains(&level) => level as u8,
        _ => {
            plan.warn(format!(
                "row {}: desired level '{}' unusable, using {}",
                row + 1,
                cell.text(),
                layout.default_desired_level
            ));
            layout.default_desired_level
        }
    }
}

/// Read the area/dimension structure without touching the database
pub fn plan_reports(grid: &Grid, layout: &ReportsLayout) -> ReportsPlan {
    let mut plan = ReportsPlan::default();

    for row in layout.first_row..grid.height() {
        let area_name = grid.text(row, layout.area_column);
        if !area_name.is_empty() {
            let desired = desired_level(grid, row, layout, &mut plan);
            match plan.areas.iter().position(|a| a.name == area_name) {
                Some(idx) => {
                    plan.warn(format!("row {}: area '{}' repeated, merging", row + 1, area_name));
                    let area = plan.areas.remove(idx);
                    plan.areas.push(PlannedArea {
                        desired_level: desired,
                        ..area
                    });
                }
                None => plan.areas.push(PlannedArea {
                    name: area_name,
                    desired_level: desired,
                    dimensions: Vec::new(),
                }),
            }
        }

        let dimension = grid.text(row, layout.dimension_column);
        if dimension.is_empty() || dimension == layout.header_text {
            continue;
        }

        let Some(area) = plan.areas.last_mut() else {
            plan.skipped += 1;
            plan.warn(format!("row {}: dimension '{}' before any area", row + 1, dimension));
            continue;
        };

        if area.dimensions.contains(&dimension) {
            let message = format!(
                "row {}: dimension '{}' repeated in area '{}'",
                row + 1,
                dimension,
                area.name
            );
            plan.skipped += 1;
            plan.warn(message);
            continue;
        }
        area.dimensions.push(dimension);
    }

    plan
}

/// Simulated starting level for a new dimension
///
/// Drawn uniformly from two below to one above the desired level, kept
/// within 1..=5.
pub fn simulated_level<R: Rng>(rng: &mut R, desired: u8) -> u8 {
    let low = desired.saturating_sub(2).max(1);
    let high = (desired + 1).min(5);
    rng.gen_range(low..=high)
}

/// Replace areas and dimensions
///
/// Existing dimensions keep their current level; only new ones get a
/// simulated one.
pub async fn load_reports(
    pool: &SqlitePool,
    path: &Path,
    layout: &ReportsLayout,
) -> Result<LoadSummary, ImportError> {
    info!(path = %path.display(), sheet = %layout.sheet, "Loading reports");

    let grid = read_sheet_blocking(path, &layout.sheet).await?;
    let plan = plan_reports(&grid, layout);
    let mut rng = StdRng::from_entropy();

    let mut summary = LoadSummary {
        skipped: plan.skipped,
        warnings: plan.warnings.clone(),
        ..LoadSummary::default()
    };

    let batch = new_import_batch();
    let mut tx = pool.begin().await?;

    for area in &plan.areas {
        let description = format!("{} Digital Maturity Assessment", area.name);
        let area_id =
            areas::upsert_area(&mut tx, &area.name, &description, area.desired_level, &batch).await?;

        for name in &area.dimensions {
            let initial = simulated_level(&mut rng, area.desired_level);
            let upsert = dimensions::upsert_dimension(
                &mut tx,
                area_id,
                name,
                area.desired_level,
                initial,
                &batch,
            )
            .await?;
            debug!(area = %area.name, dimension = %name, created = upsert.created, "Dimension upserted");
        }

        summary.per_group.insert(area.name.clone(), area.dimensions.len());
        *summary.per_level.entry(area.desired_level).or_insert(0) += area.dimensions.len();
    }

    let removed_dimensions = dimensions::remove_stale_dimensions(&mut *tx, &batch).await?;
    let removed_areas = areas::remove_stale_areas(&mut *tx, &batch).await?;
    tx.commit().await?;

    summary.records_written = plan.dimension_count();
    summary.removed = removed_dimensions + removed_areas;

    info!(
        areas = plan.areas.len(),
        dimensions = summary.records_written,
        removed = summary.removed,
        "Reports loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reports() -> Grid {
        let mut rows = vec![
            vec!["Digital Maturity Report"; 1],
            vec![""; 1],
            vec!["Area", "Dimension"],
        ];
        rows.push(vec!["Press Shop", "Strategy", "", "", "", "", "", "", "4"]);
        rows.push(vec!["", "Asset Connectivity"]);
        rows.push(vec!["", "Dimension"]);
        rows.push(vec!["Paint Shop", "Strategy", "", "", "", "", "", "", ""]);
        rows.push(vec!["", "Strategy"]);
        Grid::from_rows(rows)
    }

    #[test]
    fn test_plan_groups_dimensions_under_areas() {
        let plan = plan_reports(&reports(), &ReportsLayout::default());

        assert_eq!(plan.areas.len(), 2);
        assert_eq!(plan.areas[0].name, "Press Shop");
        assert_eq!(plan.areas[0].desired_level, 4);
        assert_eq!(plan.areas[0].dimensions, vec!["Strategy", "Asset Connectivity"]);
        assert_eq!(plan.areas[1].desired_level, 3);
        assert_eq!(plan.areas[1].dimensions, vec!["Strategy"]);
        assert_eq!(plan.dimension_count(), 3);
        assert_eq!(plan.skipped, 1);
    }

    #[test]
    fn test_simulated_level_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let level = simulated_level(&mut rng, 3);
            assert!((1..=4).contains(&level));

            let level = simulated_level(&mut rng, 1);
            assert!((1..=2).contains(&level));

            let level = simulated_level(&mut rng, 5);
            assert!((3..=5).contains(&level));
        }
    }
}
