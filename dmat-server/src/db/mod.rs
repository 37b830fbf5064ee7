//! Data access for the maturity tables
//!
//! Single-statement queries are generic over `sqlx::Executor` so callers
//! can pass either the pool or an open transaction (`&mut **tx`). Anything
//! that issues several statements takes the transaction itself.

pub mod areas;
pub mod assessments;
pub mod criteria;
pub mod dimension_assessments;
pub mod dimensions;
pub mod rating_scales;
pub mod selections;

/// Fresh token stamped on every row written by one import run
pub fn new_import_batch() -> String {
    uuid::Uuid::new_v4().to_string()
}
