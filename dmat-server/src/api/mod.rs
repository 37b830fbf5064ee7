//! HTTP API handlers for dmat-server

pub mod areas;
pub mod assessments;
pub mod criteria;
pub mod health;
pub mod refresh;
pub mod reports;

pub use areas::{get_area, list_areas, list_dimensions, simulate_update, update_dimension};
pub use assessments::{
    calculate_dimension_scores, create_assessment, get_assessment, list_assessments,
    list_selections, save_selections, selections_for_assessment, update_assessment,
};
pub use criteria::{
    list_maturity_levels, list_maturity_sections, list_rating_scales, rating_scales_for_dimension,
};
pub use health::health_routes;
pub use refresh::{
    refresh_all, refresh_checksheet, refresh_dimension_checksheet, refresh_rating_scales,
    refresh_reports,
};
pub use reports::{generate_report, reports_summary};
