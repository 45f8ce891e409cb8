//! # UKBoL Common Library
//!
//! Shared code for the UKBoL taxonomy sync and BIN matching crates:
//! - Configuration loading
//! - Database bootstrap, persisted models and store operations
//! - Raw field normalization
//! - Pagination helpers

pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod pagination;

pub use error::{Error, Result};
