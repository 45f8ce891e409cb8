//! Error types for ukbol-sync
//!
//! Every variant that can surface while reading a source (before the store is
//! touched) aborts the rebuild with the previous generation intact.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// ukbol-common error (store, configuration)
    #[error(transparent)]
    Common(#[from] ukbol_common::Error),

    /// Database error raised directly by a transaction
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (local files and archives)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Feed transport failure (connection, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Feed answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Feed payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Archive lacks the expected data member
    #[error("No member ending in {suffix:?} in archive {}", archive.display())]
    MissingMember { archive: PathBuf, suffix: String },

    /// Source yielded zero usable records
    #[error("Source produced no usable records: {0}")]
    EmptySource(String),

    /// None of the configured root taxa were found in the source
    #[error("None of the configured root taxa were found (expected: {0})")]
    NoRoots(String),
}

impl SyncError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Http {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
