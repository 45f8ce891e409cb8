//! Common error types for UKBoL

use crate::db::Entity;
use thiserror::Error;

/// Common result type for UKBoL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the sync and matcher crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML bootstrap file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Requested record does not exist in the current generation
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// Invalid caller input (paging parameters, identifiers)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }
}
