//! PANTHEON species traits import
//!
//! A snapshot is one CSV file. Column names are matched after header
//! normalization, unknown columns are ignored and blank cells are stored as
//! NULL. Non-blank values are kept exactly as found.

use crate::error::{Result, SyncError};
use crate::rebuild::RebuildContext;
use crate::sources::csv::CsvRows;
use sqlx::SqlitePool;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;
use ukbol_common::db::{pantheon, status, PantheonSpecies};
use ukbol_common::fields::RawRecord;

pub const PANTHEON_STATUS: &str = "pantheon-species";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PantheonReport {
    pub removed: u64,
    pub written: u64,
}

fn cell(row: &RawRecord, column: &str) -> Option<String> {
    row.get(column)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

/// Build a traits row from one snapshot row
pub fn pantheon_from_row(row: &RawRecord) -> PantheonSpecies {
    PantheonSpecies {
        id: 0,
        species: cell(row, "species"),
        family: cell(row, "family"),
        order: cell(row, "order"),
        sqs: cell(row, "sqs"),
        conservation_status: cell(row, "conservation_status"),
        larval_feeding_guild: cell(row, "larval_feeding_guild"),
        adult_feeding_guild: cell(row, "adult_feeding_guild"),
        broad_biotope: cell(row, "broad_biotope"),
        habitat: cell(row, "habitat"),
        resources: cell(row, "resources"),
        specific_assemblage_type: cell(row, "specific_assemblage_type"),
        habitat_score: cell(row, "habitat_score"),
        associations: cell(row, "associations"),
        common_name: cell(row, "common_name"),
        notes: cell(row, "notes"),
    }
}

/// Replace all stored PANTHEON rows with the contents of a CSV snapshot
///
/// The file is opened and its first data row read before anything is
/// deleted. `version` is recorded in the `pantheon-species` status row.
pub async fn rebuild_pantheon(
    ctx: &RebuildContext,
    csv_path: &Path,
    version: Option<&str>,
) -> Result<PantheonReport> {
    let pool = ctx.pool();
    let batch_size = ctx.config().pantheon.batch_size.max(1);

    info!(path = %csv_path.display(), "Reading PANTHEON snapshot");
    let file = File::open(csv_path)?;
    let mut rows = CsvRows::new(BufReader::new(file))?.peekable();
    if rows.peek().is_none() {
        return Err(SyncError::EmptySource(csv_path.display().to_string()));
    }

    info!("Removing existing PANTHEON species");
    let mut tx = pool.begin().await?;
    let removed = pantheon::delete_all_pantheon_species(&mut tx).await?;
    tx.commit().await?;

    let mut written = 0;
    let mut batch = Vec::with_capacity(batch_size);
    for row in rows {
        batch.push(pantheon_from_row(&row?));
        if batch.len() == batch_size {
            written += write_batch(pool, &batch).await?;
            batch.clear();
            info!(written, "PANTHEON species written so far");
        }
    }
    if !batch.is_empty() {
        written += write_batch(pool, &batch).await?;
    }

    let total = pantheon::count_pantheon_species(pool).await?;
    status::update_status(pool, PANTHEON_STATUS, total, version).await?;
    info!(species = total, removed, version = version.unwrap_or("-"), "PANTHEON snapshot imported");

    Ok(PantheonReport { removed, written })
}

async fn write_batch(pool: &SqlitePool, batch: &[PantheonSpecies]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let inserted = pantheon::insert_pantheon_species(&mut tx, batch).await?;
    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_cells_are_none() {
        let species = pantheon_from_row(&row(&[
            ("species", "Abdera biflexuosa"),
            ("family", "Melandryidae"),
            ("conservation_status", "  "),
            ("notes", ""),
            ("unexpected_column", "ignored"),
        ]));
        assert_eq!(species.species.as_deref(), Some("Abdera biflexuosa"));
        assert_eq!(species.family.as_deref(), Some("Melandryidae"));
        assert_eq!(species.conservation_status, None);
        assert_eq!(species.notes, None);
        assert_eq!(species.habitat, None);
    }

    #[test]
    fn test_values_kept_verbatim() {
        let species = pantheon_from_row(&row(&[("sqs", " 2 "), ("common_name", "None")]));
        assert_eq!(species.sqs.as_deref(), Some(" 2 "));
        assert_eq!(species.common_name.as_deref(), Some("None"));
    }
}
