//! Build persistable records from classified rows

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::classify::{ClassifiedRow, RowClass};
use super::grid::Grid;

/// Display names are cut to this many characters
pub const NAME_MAX_CHARS: usize = 100;

/// Where a set of criteria belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The plain `CheckSheet` tab, not tied to a dimension
    Global,
    Dimension(i64),
}

impl Scope {
    /// Value of the `scope_key` column
    pub fn key(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Dimension(id) => format!("dimension:{}", id),
        }
    }

    pub fn dimension_id(&self) -> Option<i64> {
        match self {
            Scope::Global => None,
            Scope::Dimension(id) => Some(*id),
        }
    }
}

/// Category heading or leaf criterion ready for upsert
#[derive(Debug, Clone, PartialEq)]
pub struct NewCriterion {
    pub level: u8,
    pub name: String,
    pub sub_level: String,
    pub category: Option<String>,
    pub description: String,
    pub score: Option<f64>,
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub level: u8,
    pub name: String,
}

/// Records of one scope
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub scope: Scope,
    pub criteria: Vec<NewCriterion>,
    pub sections: Vec<NewSection>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl RecordSet {
    /// Criteria per level
    pub fn per_level(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.criteria {
            *counts.entry(c.level).or_insert(0) += 1;
        }
        counts
    }
}

/// Cut to `NAME_MAX_CHARS` characters, never inside a code point
pub fn display_name(text: &str) -> String {
    match text.char_indices().nth(NAME_MAX_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Alternate description source for leaf rows
///
/// Per-dimension sheets carry a dimension-specific wording in the
/// dimension's own column; when that cell is empty the shared label is used.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionColumn<'a> {
    pub grid: &'a Grid,
    pub column: usize,
}

/// Turn classified rows into records for `scope`
///
/// Rows with a duplicate code (or a duplicate section level) replace the
/// earlier one, keeping the sheet's last word and logging a warning. Each
/// replaced criterion counts as skipped, so written plus skipped equals the
/// classified category and leaf rows.
pub fn build_records(
    rows: &[ClassifiedRow],
    scope: Scope,
    description_column: Option<DescriptionColumn<'_>>,
) -> RecordSet {
    let mut set = RecordSet {
        scope,
        criteria: Vec::new(),
        sections: Vec::new(),
        skipped: 0,
        warnings: Vec::new(),
    };
    let mut by_code: HashMap<String, usize> = HashMap::new();
    let mut by_level: HashMap<u8, usize> = HashMap::new();

    for row in rows {
        match &row.class {
            RowClass::Section { level, name } => {
                let section = NewSection {
                    level: level.get(),
                    name: name.clone(),
                };
                if let Some(&idx) = by_level.get(&section.level) {
                    set.warn(format!("duplicate section for level {}, keeping row {}", level, row.row + 1));
                    set.sections[idx] = section;
                } else {
                    by_level.insert(section.level, set.sections.len());
                    set.sections.push(section);
                }
            }
            RowClass::Category { code, level, label } => {
                set.push_criterion(
                    &mut by_code,
                    row.row,
                    NewCriterion {
                        level: level.get(),
                        name: display_name(label),
                        sub_level: code.clone(),
                        category: Some(label.clone()),
                        description: label.clone(),
                        score: None,
                        evidence: None,
                    },
                );
            }
            RowClass::Leaf {
                code,
                level,
                category,
                description,
                score,
                evidence,
            } => {
                let description = description_column
                    .map(|d| d.grid.text(row.row, d.column))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| description.clone());

                if description.is_empty() {
                    set.skipped += 1;
                    set.warn(format!("criterion {} on row {} has no description", code, row.row + 1));
                    continue;
                }

                set.push_criterion(
                    &mut by_code,
                    row.row,
                    NewCriterion {
                        level: level.get(),
                        name: display_name(&description),
                        sub_level: code.clone(),
                        category: category.clone(),
                        description,
                        score: *score,
                        evidence: evidence.clone(),
                    },
                );
            }
        }
    }

    set
}

impl RecordSet {
    fn warn(&mut self, message: String) {
        warn!(scope = %self.scope.key(), "{}", message);
        self.warnings.push(message);
    }

    fn push_criterion(&mut self, by_code: &mut HashMap<String, usize>, row: usize, criterion: NewCriterion) {
        match by_code.get(&criterion.sub_level) {
            Some(&idx) => {
                self.warn(format!(
                    "duplicate code {}, keeping row {}",
                    criterion.sub_level,
                    row + 1
                ));
                self.skipped += 1;
                self.criteria[idx] = criterion;
            }
            None => {
                by_code.insert(criterion.sub_level.clone(), self.criteria.len());
                self.criteria.push(criterion);
            }
        }
    }
}
