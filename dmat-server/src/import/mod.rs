//! Spreadsheet import pipeline
//!
//! reader (`grid`) → sheet geometry (`layout`) → row roles (`classify`) →
//! records (`records`) → reconcile into the database (`checksheet`,
//! `rating_scales`, `reports`). `loader` ties the stages together and turns
//! every outcome into a status/message pair for the HTTP layer and CLI.

pub mod checksheet;
pub mod classify;
pub mod grid;
pub mod layout;
pub mod loader;
pub mod rating_scales;
pub mod records;
pub mod reports;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{
    run_all, run_import, ImportKind, ImportOutcome, ImportSources, ImportStatus, LoadSummary,
    RefreshAllReport,
};

/// Import pipeline errors
///
/// Row-level problems never surface here: they are skipped and counted in
/// the `LoadSummary`. These variants abort a whole load.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Source workbook is missing; raised before any database mutation
    #[error("Excel file not found at {}", .0.display())]
    WorkbookNotFound(PathBuf),

    #[error("Cannot read workbook {}: {message}", .path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    /// `[layouts]` override does not deserialize
    #[error("Invalid sheet layout: {0}")]
    Layout(String),

    /// Blocking workbook read panicked or was cancelled
    #[error("Workbook reader task failed: {0}")]
    Task(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] dmat_common::Error),
}

impl ImportError {
    /// True when the load failed because its input file is absent
    pub fn is_missing_input(&self) -> bool {
        matches!(self, ImportError::WorkbookNotFound(_))
    }
}
