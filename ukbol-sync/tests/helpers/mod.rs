//! Test Helper Utilities
//!
//! Fixture builders shared by the rebuild integration tests

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use sqlx::SqlitePool;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use ukbol_common::config::{TaxonomyConfig, TomlConfig};
use ukbol_common::db::init_memory_database;
use ukbol_sync::RebuildContext;

/// Darwin Core taxon columns, in file order
pub const DWCA_HEADER: &str =
    "taxonID\tscientificName\tscientificNameAuthorship\ttaxonRank\ttaxonomicStatus\tparentNameUsageID\tacceptedNameUsageID";

/// One taxonomy fixture row
pub struct Row<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub rank: &'a str,
    pub status: &'a str,
    pub parent: &'a str,
    pub accepted: &'a str,
}

pub fn accepted<'a>(id: &'a str, name: &'a str, rank: &'a str, parent: &'a str) -> Row<'a> {
    Row {
        id,
        name,
        rank,
        status: "accepted",
        parent,
        accepted: "",
    }
}

pub fn synonym<'a>(id: &'a str, name: &'a str, accepted: &'a str) -> Row<'a> {
    Row {
        id,
        name,
        rank: "species",
        status: "synonym",
        parent: "",
        accepted,
    }
}

pub fn taxonomy_tsv(rows: &[Row<'_>]) -> String {
    let mut out = String::from(DWCA_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t\t{}\t{}\t{}\t{}\n",
            row.id, row.name, row.rank, row.status, row.parent, row.accepted
        ));
    }
    out
}

/// Example taxonomy: biota → eukaryota → fungi (pinned) → two phyla
///
/// Rank names are mixed case on purpose; the rebuild lowercases them.
pub fn example_rows() -> Vec<Row<'static>> {
    vec![
        accepted("b1", "Biota", "Unranked", ""),
        accepted("e1", "Eukaryota", "Domain", "b1"),
        accepted("k1", "Fungi", "Kingdom", "e1"),
        accepted("p2", "Zygomycota", "Phylum", "k1"),
        accepted("p1", "Ascomycota", "Phylum", "k1"),
        accepted("g1", "Abrothallus", "Genus", "p1"),
        accepted("s1", "Abrothallus cetrariae", "Species", "g1"),
        accepted("ss1", "Abrothallus cetrariae var. x", "Variety", "s1"),
        accepted("s2", "Misplaced species", "Species", "p1"),
        accepted("u1", "Lost group", "Functional Group", "k1"),
        accepted("g2", "Under lost group", "Genus", "u1"),
        accepted("x1", "Stray", "Order", "nowhere"),
        synonym("syn2", "Abrothallus second", "s1"),
        synonym("syn1", "Abrothallus first", "s1"),
        synonym("syn3", "Points at dropped", "s2"),
        synonym("syn4", "Points at nothing", "missing"),
    ]
}

/// Config used with [`example_rows`]: "biota" is a root and "unranked" is kept
pub fn example_config() -> TomlConfig {
    TomlConfig {
        taxonomy: TaxonomyConfig {
            root_names: ["biota", "fungi"].into_iter().map(String::from).collect(),
            excluded_ranks: ["unknown", "functional group"]
                .into_iter()
                .map(String::from)
                .collect(),
            batch_size: 3,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn memory_context(config: TomlConfig) -> RebuildContext {
    let pool = init_memory_database().await.expect("Failed to create database");
    RebuildContext::new(pool, config)
}

/// Write `content` to a file in `dir`
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Build a .tar.gz in `dir` holding the given (member path, content) pairs
pub fn write_tar_gz(dir: &TempDir, name: &str, members: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).expect("Failed to create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (member, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, member, content.as_bytes())
            .expect("Failed to append member");
    }
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .and_then(|mut file| file.flush())
        .expect("Failed to finish archive");
    path
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.expect("Count query failed")
}

/// (id, parent_id) of every stored taxon, sorted by id
pub async fn structure(pool: &SqlitePool) -> Vec<(String, Option<String>)> {
    sqlx::query_as("SELECT id, parent_id FROM taxon ORDER BY id")
        .fetch_all(pool)
        .await
        .expect("Structure query failed")
}
