//! Database row models
//!
//! One struct per table, decoded with `sqlx::FromRow` and serialized
//! verbatim into API responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub desired_level: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dimension {
    pub id: i64,
    pub area_id: i64,
    pub name: String,
    pub current_level: i64,
    pub desired_level: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A checksheet row: category header or leaf criterion
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaturityCriterion {
    pub id: i64,
    pub dimension_id: Option<i64>,
    pub level: i64,
    pub name: String,
    pub sub_level: String,
    pub category: Option<String>,
    pub description: String,
    pub score: Option<f64>,
    pub evidence: Option<String>,
}

impl MaturityCriterion {
    pub fn kind(&self) -> CriterionKind {
        CriterionKind::from_codes(Some(&self.sub_level), self.category.as_deref())
    }
}

/// Role of a criterion row, derived from its codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    /// Neither sub-level nor category: a "Level N: name" heading
    Section,
    /// Sub-level of digits and a period only, e.g. "1.1"
    Category,
    /// Sub-level with trailing letters, e.g. "1.1a"
    Leaf,
}

impl CriterionKind {
    pub fn from_codes(sub_level: Option<&str>, category: Option<&str>) -> Self {
        match sub_level.map(str::trim).filter(|s| !s.is_empty()) {
            Some(code) if code.chars().any(|c| c.is_ascii_alphabetic()) => CriterionKind::Leaf,
            Some(_) => CriterionKind::Category,
            None if category.map_or(true, |c| c.trim().is_empty()) => CriterionKind::Section,
            None => CriterionKind::Category,
        }
    }
}

/// "Level N: name" heading of a checksheet
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaturitySection {
    pub id: i64,
    pub dimension_id: Option<i64>,
    pub level: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingScaleEntry {
    pub id: i64,
    pub dimension_name: String,
    pub dimension_id: Option<i64>,
    pub level: i64,
    pub rating_name: String,
    pub digital_maturity_description: String,
    pub business_relevance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assessment {
    pub id: i64,
    pub area_id: i64,
    pub dimension_id: Option<i64>,
    pub plant_name: Option<String>,
    pub shop_unit: Option<String>,
    pub assessor_name: Option<String>,
    pub notes: Option<String>,
    pub level1_notes: Option<String>,
    pub level2_notes: Option<String>,
    pub level3_notes: Option<String>,
    pub level4_notes: Option<String>,
    pub level5_notes: Option<String>,
    pub level1_image: Option<String>,
    pub level2_image: Option<String>,
    pub level3_image: Option<String>,
    pub level4_image: Option<String>,
    pub level5_image: Option<String>,
    pub overall_count: i64,
    pub checked_count: i64,
    pub assessment_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChecksheetSelection {
    pub id: i64,
    pub assessment_id: i64,
    pub maturity_level_id: i64,
    pub is_selected: bool,
    pub evidence: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DimensionAssessment {
    pub id: i64,
    pub assessment_id: i64,
    pub dimension_id: i64,
    pub current_level: i64,
    pub evidence: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_codes() {
        assert_eq!(CriterionKind::from_codes(Some("1.1a"), Some("Data")), CriterionKind::Leaf);
        assert_eq!(CriterionKind::from_codes(Some("2.3"), Some("Data")), CriterionKind::Category);
        assert_eq!(CriterionKind::from_codes(None, None), CriterionKind::Section);
        assert_eq!(CriterionKind::from_codes(Some("  "), Some("")), CriterionKind::Section);
    }
}
