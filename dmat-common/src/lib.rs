//! # DMAT Common Library
//!
//! Shared code for the digital maturity assessment backend:
//! - Error type used across crates
//! - Bootstrap configuration (TOML + environment resolution)
//! - Database initialization and shared row models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
