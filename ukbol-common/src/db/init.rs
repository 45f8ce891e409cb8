//! Database initialization
//!
//! Opens (or creates) the SQLite database and makes sure every table the
//! sync and matcher crates use exists. Table creation is idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Connection options apply to every connection the pool opens, so the
    // foreign key and WAL settings hold for the whole pool
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database with the full schema (tests and dry runs)
///
/// A single connection that never expires: every in-memory connection is its
/// own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (safe to call repeatedly)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_taxon_table(pool).await?;
    create_synonym_table(pool).await?;
    create_specimen_table(pool).await?;
    create_pantheon_species_table(pool).await?;
    create_data_source_status_table(pool).await?;
    Ok(())
}

async fn create_taxon_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS taxon (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            authorship TEXT,
            rank TEXT NOT NULL,
            parent_id TEXT REFERENCES taxon(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_taxon_rank ON taxon(rank)",
        "CREATE INDEX IF NOT EXISTS idx_taxon_parent_id ON taxon(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_taxon_name ON taxon(name)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_synonym_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS synonym (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            authorship TEXT,
            rank TEXT NOT NULL,
            taxon_id TEXT NOT NULL REFERENCES taxon(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_synonym_taxon_id ON synonym(taxon_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_specimen_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS specimen (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            specimen_id TEXT,
            process_id TEXT,
            identification TEXT,
            identification_rank TEXT,
            cluster_id TEXT,
            country_iso TEXT,
            kingdom TEXT,
            phylum TEXT,
            class TEXT,
            "order" TEXT,
            family TEXT,
            subfamily TEXT,
            genus TEXT,
            species TEXT,
            subspecies TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_specimen_identification ON specimen(identification)",
        "CREATE INDEX IF NOT EXISTS idx_specimen_cluster_id ON specimen(cluster_id)",
        "CREATE INDEX IF NOT EXISTS idx_specimen_country_iso ON specimen(country_iso)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_pantheon_species_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pantheon_species (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            species TEXT,
            family TEXT,
            "order" TEXT,
            sqs TEXT,
            conservation_status TEXT,
            larval_feeding_guild TEXT,
            adult_feeding_guild TEXT,
            broad_biotope TEXT,
            habitat TEXT,
            resources TEXT,
            specific_assemblage_type TEXT,
            habitat_score TEXT,
            associations TEXT,
            common_name TEXT,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_pantheon_species_species ON pantheon_species(species)",
        "CREATE INDEX IF NOT EXISTS idx_pantheon_species_assemblage ON pantheon_species(specific_assemblage_type)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_data_source_status_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_source_status (
            name TEXT PRIMARY KEY,
            updated_at TEXT NOT NULL,
            version TEXT,
            total INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
