//! Barcode specimen snapshot import
//!
//! A snapshot is a `.tar.gz` holding one large TSV. Rows are streamed from
//! the archive straight into insert batches; only one batch is held in memory.

use crate::error::{Result, SyncError};
use crate::rebuild::RebuildContext;
use crate::sources::tsv::{find_member, open_tar_gz, TsvRows};
use sqlx::SqlitePool;
use std::io::BufReader;
use std::path::Path;
use tracing::info;
use ukbol_common::db::{specimens, status, SpecimenRecord};
use ukbol_common::fields::{field, Case, RawRecord};

pub const SPECIMEN_STATUS: &str = "bold-specimens";

const TSV_SUFFIX: &str = ".tsv";

/// Rank columns from broadest to narrowest
const RANK_COLUMNS: [&str; 9] = [
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "subfamily",
    "genus",
    "species",
    "subspecies",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecimenReport {
    pub member: String,
    pub removed: u64,
    pub written: u64,
}

/// Build a specimen from one snapshot row
///
/// Unknown columns are ignored. When the row has no identification, the
/// deepest populated rank column stands in for it.
pub fn specimen_from_row(row: &RawRecord) -> SpecimenRecord {
    let lower = |column: &str| field(row, column, Case::Lower);
    let ranks: [Option<String>; 9] = RANK_COLUMNS.map(lower);

    let mut identification = lower("identification");
    let mut identification_rank = lower("identification_rank");
    if identification.is_none() {
        if let Some((rank, name)) = RANK_COLUMNS
            .iter()
            .zip(&ranks)
            .rev()
            .find_map(|(rank, name)| name.as_ref().map(|name| (*rank, name.clone())))
        {
            identification = Some(name);
            identification_rank = Some(rank.to_string());
        }
    }

    let [kingdom, phylum, class, order, family, subfamily, genus, species, subspecies] = ranks;

    SpecimenRecord {
        id: 0,
        specimen_id: field(row, "specimenid", Case::Keep),
        process_id: field(row, "processid", Case::Keep),
        identification,
        identification_rank,
        cluster_id: field(row, "bin_uri", Case::Keep),
        country_iso: lower("country_iso"),
        kingdom,
        phylum,
        class,
        order,
        family,
        subfamily,
        genus,
        species,
        subspecies,
    }
}

/// Replace all stored specimens with the contents of a snapshot archive
///
/// The archive member and its first data row are located before anything is
/// deleted, so a broken or empty snapshot leaves the current data in place.
pub async fn rebuild_specimens(ctx: &RebuildContext, archive_path: &Path) -> Result<SpecimenReport> {
    let pool = ctx.pool();
    let batch_size = ctx.config().bins.specimen_batch_size.max(1);

    let mut archive = open_tar_gz(archive_path)?;
    let (member, entry) = find_member(&mut archive, TSV_SUFFIX)?.ok_or_else(|| SyncError::MissingMember {
        archive: archive_path.to_path_buf(),
        suffix: TSV_SUFFIX.to_string(),
    })?;
    info!(archive = %archive_path.display(), member = %member, "Reading specimen snapshot");

    let mut rows = TsvRows::new(BufReader::new(entry))?.peekable();
    if rows.peek().is_none() {
        return Err(SyncError::EmptySource(format!("{} in {}", member, archive_path.display())));
    }

    info!("Removing existing specimens");
    let mut tx = pool.begin().await?;
    let removed = specimens::delete_all_specimens(&mut tx).await?;
    tx.commit().await?;

    let mut written = 0;
    let mut batch = Vec::with_capacity(batch_size);
    for row in rows {
        batch.push(specimen_from_row(&row?));
        if batch.len() == batch_size {
            written += write_batch(pool, &batch).await?;
            batch.clear();
            info!(written, "Specimens written so far");
        }
    }
    if !batch.is_empty() {
        written += write_batch(pool, &batch).await?;
    }

    let total = specimens::count_specimens(pool).await?;
    status::update_status(pool, SPECIMEN_STATUS, total, None).await?;
    info!(specimens = total, removed, "Specimen snapshot imported");

    Ok(SpecimenReport {
        member,
        removed,
        written,
    })
}

async fn write_batch(pool: &SqlitePool, batch: &[SpecimenRecord]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let inserted = specimens::insert_specimens(&mut tx, batch).await?;
    tx.commit().await?;
    Ok(inserted)
}
