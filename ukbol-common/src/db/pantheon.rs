//! PANTHEON species traits store operations
//!
//! The table is replaced wholesale by each snapshot import and only read
//! through the species and assemblage lookups below.

use super::{PantheonSpecies, MAX_BIND_PARAMS};
use crate::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const PANTHEON_COLUMNS: usize = 15;

pub async fn delete_all_pantheon_species(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("DELETE FROM pantheon_species").execute(conn).await?;
    Ok(result.rows_affected())
}

/// Insert rows in slice order (their `id` is assigned by the store)
pub async fn insert_pantheon_species(
    conn: &mut SqliteConnection,
    rows: &[PantheonSpecies],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(MAX_BIND_PARAMS / PANTHEON_COLUMNS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"INSERT INTO pantheon_species (
                species, family, "order", sqs, conservation_status,
                larval_feeding_guild, adult_feeding_guild, broad_biotope, habitat,
                resources, specific_assemblage_type, habitat_score, associations,
                common_name, notes
            ) "#,
        );
        builder.push_values(chunk, |mut row, p| {
            row.push_bind(p.species.as_deref())
                .push_bind(p.family.as_deref())
                .push_bind(p.order.as_deref())
                .push_bind(p.sqs.as_deref())
                .push_bind(p.conservation_status.as_deref())
                .push_bind(p.larval_feeding_guild.as_deref())
                .push_bind(p.adult_feeding_guild.as_deref())
                .push_bind(p.broad_biotope.as_deref())
                .push_bind(p.habitat.as_deref())
                .push_bind(p.resources.as_deref())
                .push_bind(p.specific_assemblage_type.as_deref())
                .push_bind(p.habitat_score.as_deref())
                .push_bind(p.associations.as_deref())
                .push_bind(p.common_name.as_deref())
                .push_bind(p.notes.as_deref());
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

pub async fn count_pantheon_species(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pantheon_species")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Trait rows recorded for one species name, in import order
pub async fn pantheon_species_named(pool: &SqlitePool, species: &str) -> Result<Vec<PantheonSpecies>> {
    let rows = sqlx::query_as::<_, PantheonSpecies>(
        r#"
        SELECT id, species, family, "order", sqs, conservation_status,
               larval_feeding_guild, adult_feeding_guild, broad_biotope, habitat,
               resources, specific_assemblage_type, habitat_score, associations,
               common_name, notes
        FROM pantheon_species
        WHERE species = ?
        ORDER BY id
        "#,
    )
    .bind(species)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Number of species assigned to a specific assemblage type (e.g. `W211`)
pub async fn count_in_assemblage(pool: &SqlitePool, assemblage: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pantheon_species WHERE specific_assemblage_type = ?")
            .bind(assemblage)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    fn row(species: &str, assemblage: Option<&str>) -> PantheonSpecies {
        PantheonSpecies {
            species: Some(species.to_string()),
            specific_assemblage_type: assemblage.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let inserted = insert_pantheon_species(
            &mut conn,
            &[
                row("Abdera biflexuosa", Some("W211")),
                row("Abdera flexuosa", Some("W211")),
                row("Abdera biflexuosa", None),
            ],
        )
        .await
        .unwrap();
        assert_eq!(inserted, 3);
        drop(conn);

        assert_eq!(count_pantheon_species(&pool).await.unwrap(), 3);
        assert_eq!(count_in_assemblage(&pool, "W211").await.unwrap(), 2);
        assert_eq!(count_in_assemblage(&pool, "A111").await.unwrap(), 0);

        let rows = pantheon_species_named(&pool, "Abdera biflexuosa").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].specific_assemblage_type.as_deref(), Some("W211"));
        assert_eq!(rows[1].specific_assemblage_type, None);
        assert!(rows[0].id < rows[1].id);

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(delete_all_pantheon_species(&mut conn).await.unwrap(), 3);
        drop(conn);
        assert_eq!(count_pantheon_species(&pool).await.unwrap(), 0);
    }
}
