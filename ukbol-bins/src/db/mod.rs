//! Database access for the matcher
//!
//! The matcher never writes: its pool is opened read-only, and a rebuild
//! running in another process only displaces results during its own lock
//! window.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;
use ukbol_common::db::{taxa, Entity, TaxonNode};
use ukbol_common::{Error, Result};

/// Connect to an existing database in read-only mode
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Config(format!(
            "Database not found: {} (run ukbol-sync first)",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Look up the taxon a query names, converting absence into `NotFound`
///
/// This is the only place the matcher raises `NotFound`; the operations
/// themselves take an already loaded taxon.
pub async fn load_taxon(pool: &SqlitePool, id: &str) -> Result<TaxonNode> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::InvalidInput("taxon ID must not be empty".to_string()));
    }
    match taxa::get_taxon(pool, id).await? {
        Some(taxon) => Ok(taxon),
        None => {
            debug!(id, "Unknown taxon requested");
            Err(Error::not_found(Entity::Taxon, id))
        }
    }
}
