//! Declarative sheet layouts
//!
//! Each importer reads its geometry (which row holds dimension names, which
//! column holds codes, which rows are boilerplate) from one of these
//! structs instead of hard-coding offsets. Defaults describe the production
//! workbooks; any field can be overridden under `[layouts.*]` in the TOML
//! config.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::ImportError;

/// Which column plays which role in a checksheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowRoles {
    /// Sub-level code ("1.1", "1.1a")
    pub code_column: usize,
    /// Section title, category label or criterion description
    pub label_column: usize,
    pub score_column: Option<usize>,
    pub evidence_column: Option<usize>,
}

impl Default for RowRoles {
    fn default() -> Self {
        Self {
            code_column: 0,
            label_column: 1,
            score_column: Some(2),
            evidence_column: Some(3),
        }
    }
}

/// A boilerplate row marker: the row is skipped when `column` matches `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipMarker {
    pub column: usize,
    pub text: String,
    /// Whole-cell match instead of substring match
    #[serde(default)]
    pub exact: bool,
}

impl SkipMarker {
    pub fn contains(column: usize, text: &str) -> Self {
        Self { column, text: text.to_string(), exact: false }
    }

    pub fn equals(column: usize, text: &str) -> Self {
        Self { column, text: text.to_string(), exact: true }
    }

    pub fn matches(&self, grid: &Grid, row: usize) -> bool {
        let cell = grid.text(row, self.column);
        if self.exact {
            cell == self.text
        } else {
            cell.contains(&self.text)
        }
    }
}

fn default_skip_markers() -> Vec<SkipMarker> {
    vec![
        SkipMarker::contains(0, "Check Sheet for Smart Factory"),
        SkipMarker::contains(0, "Plant:"),
        SkipMarker::contains(0, "Date:"),
        SkipMarker::equals(1, "Remarks"),
        SkipMarker::equals(2, "Press Shop"),
    ]
}

/// Single criteria list (the `CheckSheet` tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksheetLayout {
    pub sheet: String,
    pub first_row: usize,
    pub roles: RowRoles,
    pub skip_markers: Vec<SkipMarker>,
}

impl Default for ChecksheetLayout {
    fn default() -> Self {
        Self {
            sheet: "CheckSheet".to_string(),
            first_row: 0,
            roles: RowRoles::default(),
            skip_markers: default_skip_markers(),
        }
    }
}

/// One criteria list per dimension column (the `Smart Factory CheckSheet` tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionSheetLayout {
    pub sheet: String,
    /// Row holding dimension names
    pub header_row: usize,
    /// First and last (inclusive) dimension columns
    pub first_dimension_column: usize,
    pub last_dimension_column: usize,
    pub first_row: usize,
    pub roles: RowRoles,
    pub skip_markers: Vec<SkipMarker>,
}

impl Default for DimensionSheetLayout {
    fn default() -> Self {
        Self {
            sheet: "Smart Factory CheckSheet".to_string(),
            header_row: 2,
            first_dimension_column: 2,
            last_dimension_column: 9,
            first_row: 3,
            roles: RowRoles {
                score_column: None,
                evidence_column: None,
                ..RowRoles::default()
            },
            skip_markers: default_skip_markers(),
        }
    }
}

impl DimensionSheetLayout {
    /// Criteria-list view of this layout used by the row classifier
    pub fn as_checksheet(&self) -> ChecksheetLayout {
        ChecksheetLayout {
            sheet: self.sheet.clone(),
            first_row: self.first_row,
            roles: self.roles.clone(),
            skip_markers: self.skip_markers.clone(),
        }
    }
}

/// Rubric grid with dimensions across and levels down (the `RatingScales` tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingScaleLayout {
    pub sheet: String,
    pub header_row: usize,
    pub level_column: usize,
    pub first_row: usize,
    /// Exclusive end row
    pub end_row: usize,
    /// Level indicator text → level; matched as substring, word aliases
    /// before digit aliases
    pub level_aliases: BTreeMap<String, u8>,
    /// Cells equal to one of these are headers, not content
    pub ignored_cells: Vec<String>,
    /// Cells containing one of these are headers, not content
    pub ignored_fragments: Vec<String>,
}

impl Default for RatingScaleLayout {
    fn default() -> Self {
        let level_aliases = [
            ("Basic", 1),
            ("Medium", 2),
            ("Advanced", 3),
            ("Leading", 4),
            ("Nirvana", 5),
            ("1", 1),
            ("2", 2),
            ("3", 3),
            ("4", 4),
            ("5", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            sheet: "RatingScales".to_string(),
            header_row: 0,
            level_column: 0,
            first_row: 3,
            end_row: 10,
            level_aliases,
            ignored_cells: vec!["Rating".to_string()],
            ignored_fragments: vec!["Classification Standard".to_string(), "Details".to_string()],
        }
    }
}

impl RatingScaleLayout {
    /// Level named by a level-column cell ("Basic", "3 - Advanced", "5")
    pub fn level_of(&self, text: &str) -> Option<u8> {
        let (digits, words): (Vec<_>, Vec<_>) = self
            .level_aliases
            .iter()
            .partition(|(alias, _)| alias.chars().all(|c| c.is_ascii_digit()));

        words
            .into_iter()
            .chain(digits)
            .find(|(alias, _)| text.contains(alias.as_str()))
            .map(|(_, level)| *level)
    }

    /// Header or label cell inside the data block
    pub fn is_ignored(&self, cell: &str) -> bool {
        self.ignored_cells.iter().any(|c| c == cell)
            || self.ignored_fragments.iter().any(|f| cell.contains(f.as_str()))
    }
}

/// Areas and their dimensions (the `Reports` tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsLayout {
    pub sheet: String,
    pub first_row: usize,
    pub area_column: usize,
    pub dimension_column: usize,
    pub desired_level_column: usize,
    pub default_desired_level: u8,
    /// Column header text that must not be read as a dimension name
    pub header_text: String,
}

impl Default for ReportsLayout {
    fn default() -> Self {
        Self {
            sheet: "Reports".to_string(),
            first_row: 3,
            area_column: 0,
            dimension_column: 1,
            desired_level_column: 8,
            default_desired_level: 3,
            header_text: "Dimension".to_string(),
        }
    }
}

/// All sheet layouts, deserializable from `[layouts]` in the TOML config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookLayouts {
    pub checksheet: ChecksheetLayout,
    pub dimension_sheet: DimensionSheetLayout,
    pub rating_scales: RatingScaleLayout,
    pub reports: ReportsLayout,
}

impl WorkbookLayouts {
    /// Layouts from the raw `[layouts]` table, or defaults when absent
    pub fn from_config(value: Option<&toml::Value>) -> Result<Self, ImportError> {
        match value {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ImportError::Layout(e.to_string())),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let value: toml::Value = toml::from_str(
            r#"
            [checksheet]
            sheet = "Criteria"
            first_row = 4

            [dimension_sheet]
            last_dimension_column = 12
            "#,
        )
        .unwrap();

        let layouts = WorkbookLayouts::from_config(Some(&value)).unwrap();
        assert_eq!(layouts.checksheet.sheet, "Criteria");
        assert_eq!(layouts.checksheet.first_row, 4);
        assert_eq!(layouts.checksheet.roles, RowRoles::default());
        assert_eq!(layouts.dimension_sheet.last_dimension_column, 12);
        assert_eq!(layouts.dimension_sheet.header_row, 2);
        assert_eq!(layouts.reports, ReportsLayout::default());
    }

    #[test]
    fn test_bad_override_is_layout_error() {
        let value: toml::Value = toml::from_str("[reports]\nfirst_row = \"three\"").unwrap();
        let err = WorkbookLayouts::from_config(Some(&value)).unwrap_err();
        assert!(matches!(err, ImportError::Layout(_)));
    }

    #[test]
    fn test_rating_level_aliases() {
        let layout = RatingScaleLayout::default();
        assert_eq!(layout.level_of("Basic"), Some(1));
        assert_eq!(layout.level_of("Nirvana (Level 5)"), Some(5));
        assert_eq!(layout.level_of("4"), Some(4));
        assert_eq!(layout.level_of("Rating"), None);
        assert!(layout.is_ignored("Rating"));
        assert!(layout.is_ignored("Classification Standard for OEE"));
        assert!(!layout.is_ignored("1 – Manual logging"));
    }

    #[test]
    fn test_skip_marker_matching() {
        let grid = Grid::from_rows([["Plant: Nashik", "Remarks", ""]]);
        assert!(SkipMarker::contains(0, "Plant:").matches(&grid, 0));
        assert!(SkipMarker::equals(1, "Remarks").matches(&grid, 0));
        assert!(!SkipMarker::equals(1, "Remark").matches(&grid, 0));
    }
}
