//! Data source status bookkeeping
//!
//! One row per imported source, replaced after every successful import.

use super::DataSourceStatus;
use crate::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Record that `name` was just imported with `total` rows
pub async fn update_status(
    pool: &SqlitePool,
    name: &str,
    total: i64,
    version: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO data_source_status (name, updated_at, version, total)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            updated_at = excluded.updated_at,
            version = excluded.version,
            total = excluded.total
        "#,
    )
    .bind(name)
    .bind(Utc::now())
    .bind(version)
    .bind(total)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_status(pool: &SqlitePool, name: &str) -> Result<Option<DataSourceStatus>> {
    let status = sqlx::query_as::<_, DataSourceStatus>(
        "SELECT name, updated_at, version, total FROM data_source_status WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(status)
}

/// All known sources, ordered by name
pub async fn list_status(pool: &SqlitePool) -> Result<Vec<DataSourceStatus>> {
    let rows = sqlx::query_as::<_, DataSourceStatus>(
        "SELECT name, updated_at, version, total FROM data_source_status ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_update_replaces_previous_row() {
        let pool = init_memory_database().await.unwrap();

        update_status(&pool, "uksi-taxa", 10, None).await.unwrap();
        update_status(&pool, "uksi-taxa", 12, Some("2024-03")).await.unwrap();
        update_status(&pool, "bold-specimens", 3, None).await.unwrap();

        let status = get_status(&pool, "uksi-taxa").await.unwrap().expect("Status missing");
        assert_eq!(status.total, 12);
        assert_eq!(status.version.as_deref(), Some("2024-03"));

        let names: Vec<_> = list_status(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["bold-specimens", "uksi-taxa"]);
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let pool = init_memory_database().await.unwrap();
        assert!(get_status(&pool, "nothing").await.unwrap().is_none());
    }
}
