//! Spreadsheet reader
//!
//! Opens a workbook, selects one sheet and exposes it as an untyped grid
//! addressed by absolute (row, column), zero-based, with no header row.

use std::fmt;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::ImportError;

/// One cell of a sheet, reduced to the types the importers care about
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Trimmed display text; empty for empty cells
    pub fn text(&self) -> String {
        self.to_string().trim().to_string()
    }

    /// Text of a criterion code cell
    ///
    /// A whole number typed into a code column keeps its decimal point, so
    /// a numeric `2.0` reads as the category code "2.0" rather than "2".
    pub fn code_text(&self) -> String {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.1}", n),
            other => other.text(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric value of a number cell or of text that parses as one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // Whole numbers print without ".0" so "3" stays "3"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(_) => CellValue::Empty,
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// Header-less rows × columns of one sheet
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Build a grid from string literals; "" is an empty cell
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| CellValue::from(c.as_ref())).collect())
            .collect();
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at (row, col); out-of-range positions read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).text()
    }

    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }
}

/// Read one named sheet of a workbook into a grid
///
/// The grid keeps absolute sheet coordinates: leading empty rows and
/// columns outside the used range are preserved as empty cells, so fixed
/// layout offsets line up with what a spreadsheet user sees.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<Grid, ImportError> {
    if !path.exists() {
        return Err(ImportError::WorkbookNotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| ImportError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(ImportError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ImportError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut grid = Grid::default();
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (row_offset, row) in range.rows().enumerate() {
        for (col_offset, data) in row.iter().enumerate() {
            let value = CellValue::from(data);
            if value != CellValue::Empty {
                grid.set(
                    start_row as usize + row_offset,
                    start_col as usize + col_offset,
                    value,
                );
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        sheet = sheet_name,
        rows = grid.height(),
        columns = grid.width(),
        "Read sheet"
    );

    Ok(grid)
}

/// `read_sheet` on the blocking thread pool
pub async fn read_sheet_blocking(path: &Path, sheet_name: &str) -> Result<Grid, ImportError> {
    let path = path.to_path_buf();
    let sheet_name = sheet_name.to_string();

    tokio::task::spawn_blocking(move || read_sheet(&path, &sheet_name))
        .await
        .map_err(|e| ImportError::Task(e.to_string()))?
}
