//! CSV export of a taxon's associated specimens
//!
//! Rows are written one chunk at a time, so an export never holds more than
//! `chunk_size` specimens in memory.

use crate::matcher::specimens_in_clusters_of;
use crate::MatchContext;
use futures::TryStreamExt;
use std::pin::pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;
use ukbol_common::db::{SpecimenRecord, TaxonNode};
use ukbol_common::Result;

/// Header row, in column order
pub const CSV_COLUMNS: [&str; 15] = [
    "specimen_id",
    "process_id",
    "identification",
    "identification_rank",
    "cluster_id",
    "country_iso",
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

/// Write every associated specimen as CSV, ordered by (cluster_id, id)
///
/// Returns the number of data rows written. Absent values are empty fields.
pub async fn write_cluster_csv<W>(ctx: &MatchContext, taxon: &TaxonNode, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let associated = specimens_in_clusters_of(ctx, taxon).await?;

    let mut buffer = String::new();
    push_row(&mut buffer, CSV_COLUMNS.map(Some));
    writer.write_all(buffer.as_bytes()).await?;

    let mut written = 0;
    let mut chunks = pin!(associated.specimen_chunks(ctx.config().chunk_size));
    while let Some(chunk) = chunks.try_next().await? {
        buffer.clear();
        for specimen in &chunk {
            push_row(&mut buffer, specimen_fields(specimen));
        }
        writer.write_all(buffer.as_bytes()).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;

    info!(taxon = %taxon.id, clusters = associated.clusters().len(), rows = written, "CSV export complete");
    Ok(written)
}

fn specimen_fields(s: &SpecimenRecord) -> [Option<&str>; 15] {
    [
        s.specimen_id.as_deref(),
        s.process_id.as_deref(),
        s.identification.as_deref(),
        s.identification_rank.as_deref(),
        s.cluster_id.as_deref(),
        s.country_iso.as_deref(),
        s.kingdom.as_deref(),
        s.phylum.as_deref(),
        s.class.as_deref(),
        s.order.as_deref(),
        s.family.as_deref(),
        s.subfamily.as_deref(),
        s.genus.as_deref(),
        s.species.as_deref(),
        s.subspecies.as_deref(),
    ]
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = Option<&'a str>>) {
    for (i, value) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if let Some(value) = value {
            push_field(out, value);
        }
    }
    out.push_str("\r\n");
}

/// RFC 4180 quoting: only fields holding a delimiter, quote or line break are quoted
fn push_field(out: &mut String, value: &str) {
    if value.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}
