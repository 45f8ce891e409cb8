//! Synonym store operations

use super::{SynonymRecord, MAX_BIND_PARAMS};
use crate::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const SYNONYM_COLUMNS: usize = 5;

pub async fn delete_all_synonyms(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("DELETE FROM synonym").execute(conn).await?;
    Ok(result.rows_affected())
}

/// Insert synonyms; each accepted taxon must already be stored
pub async fn insert_synonyms(
    conn: &mut SqliteConnection,
    synonyms: &[SynonymRecord],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in synonyms.chunks(MAX_BIND_PARAMS / SYNONYM_COLUMNS) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO synonym (id, name, authorship, rank, taxon_id) ");
        builder.push_values(chunk, |mut row, synonym| {
            row.push_bind(synonym.id.as_str())
                .push_bind(synonym.name.as_str())
                .push_bind(synonym.authorship.as_deref())
                .push_bind(synonym.rank.as_str())
                .push_bind(synonym.accepted_taxon_id.as_str());
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

pub async fn get_synonym(pool: &SqlitePool, id: &str) -> Result<Option<SynonymRecord>> {
    let synonym = sqlx::query_as::<_, SynonymRecord>(
        "SELECT id, name, authorship, rank, taxon_id FROM synonym WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(synonym)
}

/// Synonyms of an accepted taxon, ordered by synonym ID
pub async fn synonyms_of(pool: &SqlitePool, taxon_id: &str) -> Result<Vec<SynonymRecord>> {
    let synonyms = sqlx::query_as::<_, SynonymRecord>(
        r#"
        SELECT id, name, authorship, rank, taxon_id
        FROM synonym
        WHERE taxon_id = ?
        ORDER BY id
        "#,
    )
    .bind(taxon_id)
    .fetch_all(pool)
    .await?;
    Ok(synonyms)
}

pub async fn count_synonyms(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM synonym")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
