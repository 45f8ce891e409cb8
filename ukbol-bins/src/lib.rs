//! ukbol-bins library - cluster-based associative matching
//!
//! Specimens are matched to a taxon by exact name (the taxon's name plus its
//! synonyms), then widened to every specimen sharing a barcode cluster (BIN)
//! with one of those matches. All operations are read-only and take a taxon
//! that the caller has already loaded.

use sqlx::SqlitePool;
use ukbol_common::config::BinsConfig;

pub mod closure;
pub mod db;
pub mod export;
pub mod listing;
pub mod matcher;
pub mod summary;

pub use closure::name_closure;
pub use export::write_cluster_csv;
pub use listing::{associated_specimens, specimens_named, SpecimenPage};
pub use matcher::{cluster_ids_for, specimens_in_clusters_of, AssociatedSpecimens};
pub use summary::{summarize, summarize_specimens, ClusterSummary, NameCount};

/// Store handle and matcher settings, passed to every query
#[derive(Debug, Clone)]
pub struct MatchContext {
    pool: SqlitePool,
    config: BinsConfig,
}

impl MatchContext {
    pub fn new(pool: SqlitePool, config: BinsConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &BinsConfig {
        &self.config
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
