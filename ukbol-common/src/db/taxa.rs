//! Taxon store operations
//!
//! Writes take a connection so the rebuild can run them inside its own
//! transactions; reads take the pool.

use super::{TaxonNode, MAX_BIND_PARAMS};
use crate::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const TAXON_COLUMNS: usize = 5;

/// Ancestor walks stop here even if stored data were to loop
const MAX_ANCESTOR_DEPTH: i64 = 256;

/// Delete every taxon row
///
/// Synonyms reference taxa, so they must be deleted first.
pub async fn delete_all_taxa(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("DELETE FROM taxon").execute(conn).await?;
    Ok(result.rows_affected())
}

/// Insert taxa in slice order
///
/// Every `parent_id` must reference a taxon inserted earlier (in this call or
/// a previous one), otherwise the foreign key check rejects the statement.
pub async fn insert_taxa(conn: &mut SqliteConnection, taxa: &[TaxonNode]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in taxa.chunks(MAX_BIND_PARAMS / TAXON_COLUMNS) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO taxon (id, name, authorship, rank, parent_id) ");
        builder.push_values(chunk, |mut row, taxon| {
            row.push_bind(taxon.id.as_str())
                .push_bind(taxon.name.as_str())
                .push_bind(taxon.authorship.as_deref())
                .push_bind(taxon.rank.as_str())
                .push_bind(taxon.parent_id.as_deref());
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

/// Load taxon by ID
pub async fn get_taxon(pool: &SqlitePool, id: &str) -> Result<Option<TaxonNode>> {
    let taxon = sqlx::query_as::<_, TaxonNode>(
        "SELECT id, name, authorship, rank, parent_id FROM taxon WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(taxon)
}

/// Taxa without a parent, ordered by name
pub async fn root_taxa(pool: &SqlitePool) -> Result<Vec<TaxonNode>> {
    let roots = sqlx::query_as::<_, TaxonNode>(
        r#"
        SELECT id, name, authorship, rank, parent_id
        FROM taxon
        WHERE parent_id IS NULL
        ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(roots)
}

/// Direct children of a taxon, ordered by name
pub async fn child_taxa(pool: &SqlitePool, id: &str) -> Result<Vec<TaxonNode>> {
    let children = sqlx::query_as::<_, TaxonNode>(
        r#"
        SELECT id, name, authorship, rank, parent_id
        FROM taxon
        WHERE parent_id = ?
        ORDER BY name, id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(children)
}

/// IDs of every ancestor of a taxon, nearest first
///
/// The taxon's own ID is not included; a root yields an empty list.
pub async fn parent_ids(pool: &SqlitePool, id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        WITH RECURSIVE ancestors(id, parent_id, depth) AS (
            SELECT id, parent_id, 0 FROM taxon WHERE id = ?
            UNION ALL
            SELECT t.id, t.parent_id, a.depth + 1
            FROM taxon t
            JOIN ancestors a ON t.id = a.parent_id
            WHERE a.depth < ?
        )
        SELECT id FROM ancestors WHERE depth > 0 ORDER BY depth
        "#,
    )
    .bind(id)
    .bind(MAX_ANCESTOR_DEPTH)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn count_taxa(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM taxon")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
