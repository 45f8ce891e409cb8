//! Specimen store operations
//!
//! Specimens are read-only to the matcher: it only filters, groups and counts
//! them. The snapshot import replaces the whole table.

use super::{SpecimenRecord, MAX_BIND_PARAMS};
use crate::Result;
use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;

const SPECIMEN_COLUMNS: usize = 15;

const SELECT_SPECIMEN: &str = r#"
    SELECT id, specimen_id, process_id, identification, identification_rank,
           cluster_id, country_iso, kingdom, phylum, class, "order", family,
           subfamily, genus, species, subspecies
    FROM specimen
"#;

pub async fn delete_all_specimens(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("DELETE FROM specimen").execute(conn).await?;
    Ok(result.rows_affected())
}

/// Insert specimens in slice order (their `id` is assigned by the store)
pub async fn insert_specimens(
    conn: &mut SqliteConnection,
    specimens: &[SpecimenRecord],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in specimens.chunks(MAX_BIND_PARAMS / SPECIMEN_COLUMNS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"INSERT INTO specimen (
                specimen_id, process_id, identification, identification_rank,
                cluster_id, country_iso, kingdom, phylum, class, "order", family,
                subfamily, genus, species, subspecies
            ) "#,
        );
        builder.push_values(chunk, |mut row, s| {
            row.push_bind(s.specimen_id.as_deref())
                .push_bind(s.process_id.as_deref())
                .push_bind(s.identification.as_deref())
                .push_bind(s.identification_rank.as_deref())
                .push_bind(s.cluster_id.as_deref())
                .push_bind(s.country_iso.as_deref())
                .push_bind(s.kingdom.as_deref())
                .push_bind(s.phylum.as_deref())
                .push_bind(s.class.as_deref())
                .push_bind(s.order.as_deref())
                .push_bind(s.family.as_deref())
                .push_bind(s.subfamily.as_deref())
                .push_bind(s.genus.as_deref())
                .push_bind(s.species.as_deref())
                .push_bind(s.subspecies.as_deref());
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

pub async fn count_specimens(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM specimen")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Distinct cluster IDs of specimens identified as any of `names`
///
/// Specimens without a cluster are ignored.
pub async fn distinct_cluster_ids(
    pool: &SqlitePool,
    names: &BTreeSet<String>,
) -> Result<BTreeSet<String>> {
    if names.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT DISTINCT cluster_id FROM specimen WHERE cluster_id IS NOT NULL AND ");
    push_in_list(&mut builder, "identification", names);

    let clusters = builder
        .build_query_scalar::<String>()
        .fetch_all(pool)
        .await?;
    Ok(clusters.into_iter().collect())
}

/// Lazily stream every specimen in `clusters`, ordered by (cluster_id, id)
///
/// Each call starts a fresh query, so the sequence can be restarted by
/// calling again. Specimens of one cluster always form one contiguous run.
pub fn specimens_in_clusters<'a>(
    pool: &'a SqlitePool,
    clusters: &'a BTreeSet<String>,
) -> impl Stream<Item = Result<SpecimenRecord>> + 'a {
    try_stream! {
        if !clusters.is_empty() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SPECIMEN);
            builder.push(" WHERE ");
            push_in_list(&mut builder, "cluster_id", clusters);
            builder.push(" ORDER BY cluster_id, id");

            let mut rows = builder.build_query_as::<SpecimenRecord>().fetch(pool);
            while let Some(specimen) = rows.try_next().await? {
                yield specimen;
            }
        }
    }
}

/// One page of specimens in `clusters`, ordered by (cluster_id, id)
pub async fn specimens_in_clusters_page(
    pool: &SqlitePool,
    clusters: &BTreeSet<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SpecimenRecord>> {
    page_where(pool, "cluster_id", clusters, "cluster_id, id", limit, offset).await
}

pub async fn count_specimens_in_clusters(
    pool: &SqlitePool,
    clusters: &BTreeSet<String>,
) -> Result<i64> {
    count_where(pool, "cluster_id", clusters).await
}

/// One page of specimens identified as any of `names`, ordered by (identification, id)
pub async fn specimens_named(
    pool: &SqlitePool,
    names: &BTreeSet<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SpecimenRecord>> {
    page_where(pool, "identification", names, "identification, id", limit, offset).await
}

pub async fn count_specimens_named(pool: &SqlitePool, names: &BTreeSet<String>) -> Result<i64> {
    count_where(pool, "identification", names).await
}

async fn page_where(
    pool: &SqlitePool,
    column: &str,
    values: &BTreeSet<String>,
    order_by: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<SpecimenRecord>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SPECIMEN);
    builder.push(" WHERE ");
    push_in_list(&mut builder, column, values);
    builder.push(" ORDER BY ");
    builder.push(order_by);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let specimens = builder
        .build_query_as::<SpecimenRecord>()
        .fetch_all(pool)
        .await?;
    Ok(specimens)
}

async fn count_where(pool: &SqlitePool, column: &str, values: &BTreeSet<String>) -> Result<i64> {
    if values.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM specimen WHERE ");
    push_in_list(&mut builder, column, values);

    let count = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

/// Append `column IN (?, ?, ...)` binding every value
fn push_in_list<'a>(builder: &mut QueryBuilder<'a, Sqlite>, column: &str, values: &'a BTreeSet<String>) {
    builder.push(column);
    builder.push(" IN (");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.as_str());
    }
    separated.push_unseparated(")");
}
