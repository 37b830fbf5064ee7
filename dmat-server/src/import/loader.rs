//! Import orchestration
//!
//! `run_import` performs one load and folds any failure into an
//! `ImportOutcome` carrying a status and a human-readable message; it never
//! returns an error. `run_all` runs every load in dependency order (areas
//! and dimensions first, since the other sheets resolve dimension names)
//! and reports partial success when some of them fail.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dmat_common::config::TomlConfig;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use super::checksheet::{load_checksheet, load_dimension_checksheet};
use super::layout::WorkbookLayouts;
use super::rating_scales::load_rating_scales;
use super::reports::load_reports;
use super::ImportError;

/// One of the four loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// Areas and dimensions (`Reports` tab)
    Reports,
    /// `RatingScales` tab
    RatingScales,
    /// Global criteria (`CheckSheet` tab)
    Checksheet,
    /// Per-dimension criteria (`Smart Factory CheckSheet` tab)
    DimensionChecksheet,
}

impl ImportKind {
    /// Dependency order used by `run_all`
    pub const ALL: [ImportKind; 4] = [
        ImportKind::Reports,
        ImportKind::RatingScales,
        ImportKind::Checksheet,
        ImportKind::DimensionChecksheet,
    ];

    /// Key of this load in the refresh-all response
    pub fn key(self) -> &'static str {
        match self {
            ImportKind::Reports => "reports",
            ImportKind::RatingScales => "rating_scales",
            ImportKind::Checksheet => "maturity_levels",
            ImportKind::DimensionChecksheet => "dimension_checksheet",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImportKind::Reports => "Reports",
            ImportKind::RatingScales => "Rating Scales",
            ImportKind::Checksheet => "Maturity Levels",
            ImportKind::DimensionChecksheet => "Dimension Checksheet",
        }
    }
}

/// Workbook locations and sheet layouts for all loads
#[derive(Debug, Clone)]
pub struct ImportSources {
    /// Holds the `CheckSheet` and `RatingScales` tabs
    pub checksheet_workbook: PathBuf,
    /// Holds the `Reports` and `Smart Factory CheckSheet` tabs
    pub maturity_workbook: PathBuf,
    pub layouts: WorkbookLayouts,
}

impl ImportSources {
    pub fn new(checksheet_workbook: PathBuf, maturity_workbook: PathBuf) -> Self {
        Self {
            checksheet_workbook,
            maturity_workbook,
            layouts: WorkbookLayouts::default(),
        }
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, ImportError> {
        Ok(Self {
            checksheet_workbook: config.workbooks.checksheet.clone(),
            maturity_workbook: config.workbooks.maturity.clone(),
            layouts: WorkbookLayouts::from_config(config.layouts.as_ref())?,
        })
    }

    pub fn workbook_for(&self, kind: ImportKind) -> &PathBuf {
        match kind {
            ImportKind::Reports | ImportKind::DimensionChecksheet => &self.maturity_workbook,
            ImportKind::RatingScales | ImportKind::Checksheet => &self.checksheet_workbook,
        }
    }

    pub fn all_present(&self) -> bool {
        self.checksheet_workbook.exists() && self.maturity_workbook.exists()
    }
}

/// Counters of one completed load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    /// Records in scope after the load
    pub records_written: usize,
    /// Rows of the previous load no longer present in the sheet
    pub removed: u64,
    /// Sheet rows with content that produced no record
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub per_level: BTreeMap<u8, usize>,
    /// Per dimension (checksheets, rating scales) or per area (reports)
    pub per_group: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Success,
    Error,
}

/// Result of one load as reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub status: ImportStatus,
    pub message: String,
    pub records_loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LoadSummary>,
    /// Failure was a missing workbook rather than bad content
    #[serde(skip)]
    pub missing_input: bool,
}

impl ImportOutcome {
    pub fn success(kind: ImportKind, summary: LoadSummary) -> Self {
        let n = summary.records_written;
        let message = match kind {
            ImportKind::Reports => format!(
                "Successfully loaded {} areas with {} dimensions",
                summary.per_group.len(),
                n
            ),
            ImportKind::RatingScales => {
                format!("Rating Scales data refreshed successfully - {} records loaded", n)
            }
            ImportKind::Checksheet => format!(
                "CheckSheet data refreshed successfully - {} maturity criteria loaded",
                n
            ),
            ImportKind::DimensionChecksheet => format!(
                "Dimension checksheet refreshed successfully - {} maturity criteria loaded across {} dimensions",
                n,
                summary.per_group.len()
            ),
        };

        Self {
            status: ImportStatus::Success,
            message,
            records_loaded: n,
            summary: Some(summary),
            missing_input: false,
        }
    }

    fn failure(kind: ImportKind, err: &ImportError) -> Self {
        Self {
            status: ImportStatus::Error,
            message: format!("Error refreshing {}: {}", kind.label(), err),
            records_loaded: 0,
            summary: None,
            missing_input: err.is_missing_input(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Success
    }
}

/// Run one load, returning its summary or the error that aborted it
pub async fn load(
    pool: &SqlitePool,
    sources: &ImportSources,
    kind: ImportKind,
) -> Result<LoadSummary, ImportError> {
    let path = sources.workbook_for(kind);
    let layouts = &sources.layouts;

    match kind {
        ImportKind::Reports => load_reports(pool, path, &layouts.reports).await,
        ImportKind::RatingScales => load_rating_scales(pool, path, &layouts.rating_scales).await,
        ImportKind::Checksheet => load_checksheet(pool, path, &layouts.checksheet).await,
        ImportKind::DimensionChecksheet => {
            load_dimension_checksheet(pool, path, &layouts.dimension_sheet).await
        }
    }
}

/// Run one load and report it as an outcome
pub async fn run_import(pool: &SqlitePool, sources: &ImportSources, kind: ImportKind) -> ImportOutcome {
    match load(pool, sources, kind).await {
        Ok(summary) => {
            let outcome = ImportOutcome::success(kind, summary);
            info!(kind = kind.key(), "{}", outcome.message);
            outcome
        }
        Err(e) => {
            let outcome = ImportOutcome::failure(kind, &e);
            error!(kind = kind.key(), "{}", outcome.message);
            outcome
        }
    }
}

/// Aggregate of `run_all`
#[derive(Debug, Clone, Serialize)]
pub struct RefreshAllReport {
    /// "success" or "partial_success"
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub results: BTreeMap<&'static str, ImportOutcome>,
}

impl RefreshAllReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every load; a failing load does not stop the ones after it
pub async fn run_all(pool: &SqlitePool, sources: &ImportSources) -> RefreshAllReport {
    let mut results = BTreeMap::new();
    let mut errors = Vec::new();

    for kind in ImportKind::ALL {
        let outcome = run_import(pool, sources, kind).await;
        if !outcome.is_success() {
            errors.push(format!("{}: {}", kind.label(), outcome.message));
        }
        results.insert(kind.key(), outcome);
    }

    let (status, message) = if errors.is_empty() {
        ("success", "All data refreshed successfully".to_string())
    } else {
        ("partial_success", format!("Completed with {} error(s)", errors.len()))
    };

    RefreshAllReport {
        status: status.to_string(),
        message,
        errors,
        results,
    }
}
