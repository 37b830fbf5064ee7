//! Row classification for checksheet-shaped sheets
//!
//! Walks a grid top to bottom and decides, per row, whether it is a level
//! section heading, a category heading, a leaf criterion, or noise. Category
//! context carries forward from row to row. Nothing here fails: malformed
//! rows are skipped and reported as warnings.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::grid::Grid;
use super::layout::{ChecksheetLayout, DimensionSheetLayout};

/// "Level 3: Integrated"; digits directly after "Level", name after the colon
static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Level\s*(\d*)[^:]*:(.*)$").expect("valid section regex"));

/// "2.1"
static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)$").expect("valid category regex"));

/// "2.1a", "2.1bc"
static LEAF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)([a-z]+)$").expect("valid leaf regex"));

/// Maturity level, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Some(Level(value as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of one sheet row
#[derive(Debug, Clone, PartialEq)]
pub enum RowClass {
    Section {
        level: Level,
        name: String,
    },
    Category {
        code: String,
        level: Level,
        label: String,
    },
    Leaf {
        code: String,
        level: Level,
        category: Option<String>,
        description: String,
        score: Option<f64>,
        evidence: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    /// Absolute sheet row
    pub row: usize,
    pub class: RowClass,
}

/// Result of walking one sheet
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub rows: Vec<ClassifiedRow>,
    /// Rows that carried content but were not usable
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl Classification {
    fn skip(&mut self, row: usize, reason: String) {
        warn!(row, "{}", reason);
        self.skipped += 1;
        self.warnings.push(format!("row {}: {}", row + 1, reason));
    }

    pub fn sections(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r.class, RowClass::Section { .. }))
    }

    /// Category and leaf rows
    pub fn criteria(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows
            .iter()
            .filter(|r| !matches!(r.class, RowClass::Section { .. }))
    }
}

enum Code {
    Category { major: i64 },
    Leaf { major: i64 },
    /// Starts like a code but does not parse as one
    Malformed,
    None,
}

fn parse_code(code: &str) -> Code {
    if code.is_empty() {
        return Code::None;
    }
    if let Some(caps) = CATEGORY_RE.captures(code) {
        return match caps[1].parse() {
            Ok(major) => Code::Category { major },
            Err(_) => Code::Malformed,
        };
    }
    if let Some(caps) = LEAF_RE.captures(code) {
        return match caps[1].parse() {
            Ok(major) => Code::Leaf { major },
            Err(_) => Code::Malformed,
        };
    }
    if code.starts_with(|c: char| c.is_ascii_digit()) {
        Code::Malformed
    } else {
        Code::None
    }
}

/// Parse a "Level N: name" heading into its level number and name
///
/// Returns `None` when the text is not a heading at all; `Some(Err(_))`
/// when it is one but the level number is missing or out of range.
pub fn parse_section(label: &str) -> Option<Result<(Level, String), String>> {
    let caps = SECTION_RE.captures(label)?;
    let name = caps[2].trim().to_string();

    let parsed = caps[1]
        .parse::<i64>()
        .map_err(|_| format!("section heading '{}' has no level number", label))
        .and_then(|n| {
            Level::new(n).ok_or_else(|| format!("section level {} outside 1-5", n))
        })
        .map(|level| (level, name));

    Some(parsed)
}

/// Classify every row of a checksheet from `layout.first_row` down
pub fn classify_rows(grid: &Grid, layout: &ChecksheetLayout) -> Classification {
    let roles = &layout.roles;
    let mut result = Classification::default();
    let mut current_category: Option<String> = None;

    for row in layout.first_row..grid.height() {
        if layout.skip_markers.iter().any(|m| m.matches(grid, row)) {
            continue;
        }

        let code = grid.cell(row, roles.code_column).code_text();
        let label = grid.text(row, roles.label_column);
        if code.is_empty() && label.is_empty() {
            continue;
        }

        // A heading label wins over whatever sits in the code column
        match parse_section(&label) {
            Some(Ok((level, name))) => {
                result.rows.push(ClassifiedRow {
                    row,
                    class: RowClass::Section { level, name },
                });
                continue;
            }
            Some(Err(reason)) => {
                result.skip(row, reason);
                continue;
            }
            None => {}
        }

        match parse_code(&code) {
            Code::None => {}
            Code::Category { major } => {
                let Some(level) = Level::new(major) else {
                    result.skip(row, format!("category {} level outside 1-5", code));
                    continue;
                };
                if label.is_empty() {
                    current_category = None;
                    result.skip(row, format!("category {} has no label", code));
                    continue;
                }
                current_category = Some(label.clone());
                result.rows.push(ClassifiedRow {
                    row,
                    class: RowClass::Category { code, level, label },
                });
            }
            Code::Leaf { major } => {
                let Some(level) = Level::new(major) else {
                    result.skip(row, format!("criterion {} level outside 1-5", code));
                    continue;
                };
                let score = match roles.score_column {
                    Some(col) => read_score(grid, row, col, &code, &mut result),
                    None => None,
                };
                let evidence = roles
                    .evidence_column
                    .map(|col| grid.text(row, col))
                    .filter(|s| !s.is_empty());

                result.rows.push(ClassifiedRow {
                    row,
                    class: RowClass::Leaf {
                        code,
                        level,
                        category: current_category.clone(),
                        description: label,
                        score,
                        evidence,
                    },
                });
            }
            Code::Malformed => {
                result.skip(row, format!("unrecognized criterion code '{}'", code));
            }
        }
    }

    result
}

fn read_score(
    grid: &Grid,
    row: usize,
    col: usize,
    code: &str,
    result: &mut Classification,
) -> Option<f64> {
    let cell = grid.cell(row, col);
    if cell.is_empty() {
        return None;
    }
    match cell.as_f64() {
        Some(score) => Some(score),
        None => {
            let reason = format!("criterion {} score '{}' is not a number", code, cell.text());
            warn!(row, "{}", reason);
            result.warnings.push(format!("row {}: {}", row + 1, reason));
            None
        }
    }
}

/// A dimension column of a per-dimension checksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionColumn {
    pub column: usize,
    pub name: String,
}

/// Dimension names across the header row, in column order
pub fn dimension_columns(grid: &Grid, layout: &DimensionSheetLayout) -> Vec<DimensionColumn> {
    (layout.first_dimension_column..=layout.last_dimension_column)
        .filter_map(|column| {
            let name = grid.text(layout.header_row, column);
            (!name.is_empty()).then_some(DimensionColumn { column, name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksheet() -> Grid {
        Grid::from_rows(vec![
            vec!["Check Sheet for Smart Factory", "", "", ""],
            vec!["Plant: Nashik", "", "Press Shop", ""],
            vec!["", "Level 1: Connected & Visible", "", ""],
            vec!["1.1", "Data Acquisition", "", ""],
            vec!["1.1a", "Machine states captured automatically", "2", "PLC tags"],
            vec!["1.1b", "Downtime reasons logged", "n/a", ""],
            vec!["", "Remarks", "", ""],
            vec!["", "Level 3: Integrated", "", ""],
            vec!["3.2", "Traceability", "", ""],
            vec!["3.2c", "Genealogy per part", "", ""],
        ])
    }

    #[test]
    fn test_section_heading() {
        let (level, name) = parse_section("Level 3: Integrated").unwrap().unwrap();
        assert_eq!(level.get(), 3);
        assert_eq!(name, "Integrated");

        assert!(parse_section("Data Acquisition").is_none());
        assert!(parse_section("Level 9: Beyond").unwrap().is_err());
        assert!(parse_section("Level: unnumbered").unwrap().is_err());
    }

    #[test]
    fn test_classifies_all_row_kinds() {
        let result = classify_rows(&checksheet(), &ChecksheetLayout::default());

        assert_eq!(result.sections().count(), 2);
        assert_eq!(result.criteria().count(), 5);
        assert_eq!(result.skipped, 0);

        let leaf = &result.rows[2];
        assert_eq!(leaf.row, 4);
        match &leaf.class {
            RowClass::Leaf { code, level, category, score, evidence, .. } => {
                assert_eq!(code, "1.1a");
                assert_eq!(level.get(), 1);
                assert_eq!(category.as_deref(), Some("Data Acquisition"));
                assert_eq!(*score, Some(2.0));
                assert_eq!(evidence.as_deref(), Some("PLC tags"));
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_leaf_level_is_leading_integer() {
        let result = classify_rows(&checksheet(), &ChecksheetLayout::default());
        for row in result.criteria() {
            if let RowClass::Leaf { code, level, .. } = &row.class {
                let leading: u8 = code.split('.').next().unwrap().parse().unwrap();
                assert_eq!(level.get(), leading);
            }
        }
    }

    #[test]
    fn test_unparseable_score_keeps_row() {
        let result = classify_rows(&checksheet(), &ChecksheetLayout::default());
        let leaf = result
            .rows
            .iter()
            .find(|r| matches!(&r.class, RowClass::Leaf { code, .. } if code == "1.1b"))
            .unwrap();

        assert!(matches!(leaf.class, RowClass::Leaf { score: None, .. }));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_heading_label_beats_criterion_code() {
        let grid = Grid::from_rows(vec![
            vec!["1.1", "Data"],
            vec!["1.1a", "Level 2: machines connected"],
            vec!["2.1a", "Sensors on every line"],
        ]);

        let result = classify_rows(&grid, &ChecksheetLayout::default());
        assert_eq!(result.rows.len(), 3);
        assert_eq!(
            result.rows[1].class,
            RowClass::Section {
                level: Level::new(2).unwrap(),
                name: "machines connected".to_string(),
            }
        );
        match &result.rows[2].class {
            RowClass::Leaf { level, category, .. } => {
                assert_eq!(level.get(), 2);
                assert_eq!(category.as_deref(), Some("Data"));
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_code_cell_is_category() {
        let mut grid = Grid::from_rows(vec![vec!["", "Planning"]]);
        grid.set(0, 0, crate::import::grid::CellValue::Number(2.0));

        let result = classify_rows(&grid, &ChecksheetLayout::default());
        assert_eq!(result.skipped, 0);
        assert!(matches!(
            &result.rows[0].class,
            RowClass::Category { code, .. } if code == "2.0"
        ));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let grid = Grid::from_rows(vec![
            vec!["7.1", "Out of range category"],
            vec!["1.1.1", "Three part code"],
            vec!["1.2", "Valid"],
            vec!["1.2A", "Upper-case suffix"],
            vec!["", "Level 0: Nothing"],
        ]);

        let result = classify_rows(&grid, &ChecksheetLayout::default());
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.skipped, 4);
    }

    #[test]
    fn test_dimension_columns_skip_blanks() {
        let grid = Grid::from_rows(vec![
            vec![""],
            vec![""],
            vec!["", "", "Strategy", "", "Asset Connectivity"],
        ]);

        let columns = dimension_columns(&grid, &DimensionSheetLayout::default());
        assert_eq!(
            columns,
            vec![
                DimensionColumn { column: 2, name: "Strategy".into() },
                DimensionColumn { column: 4, name: "Asset Connectivity".into() },
            ]
        );
    }
}
