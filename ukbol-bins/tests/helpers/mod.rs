//! Test Helper Utilities
//!
//! Seeded in-memory stores for the matcher integration tests

#![allow(dead_code)]

use ukbol_bins::MatchContext;
use ukbol_common::config::BinsConfig;
use ukbol_common::db::{
    init_memory_database, specimens::insert_specimens, synonyms::insert_synonyms,
    taxa::insert_taxa, SpecimenRecord, SynonymRecord, TaxonNode,
};

pub const CRABRO: &str = "vespa crabro";
pub const GERMANA: &str = "vespa crabro germana";

fn taxon(id: &str, name: &str, parent: Option<&str>) -> TaxonNode {
    TaxonNode {
        id: id.to_string(),
        name: name.to_string(),
        authorship: None,
        rank: (if parent.is_some() { "species" } else { "genus" }).to_string(),
        parent_id: parent.map(String::from),
    }
}

/// (identification, cluster, country) for specimens s01..s16, in insert order
///
/// Four are identified as the taxon, three under its synonym and nine as
/// something else; four of those nine share a cluster with a match.
const SPECIMENS: [(&str, Option<&str>, &str); 16] = [
    (CRABRO, Some("BOLD:AAA"), "gb"),
    (GERMANA, Some("BOLD:AAB"), "gb"),
    ("vespa velutina", Some("BOLD:AAA"), "fr"),
    (CRABRO, Some("BOLD:AAA"), "gb"),
    ("apis mellifera", Some("BOLD:ZZZ"), "gb"),
    (GERMANA, Some("BOLD:AAB"), "gb"),
    (CRABRO, None, "gb"),
    ("vespula vulgaris", Some("BOLD:AAB"), "ie"),
    ("apis mellifera", Some("BOLD:ZZZ"), "gb"),
    (CRABRO, Some("BOLD:AAA"), "fr"),
    (GERMANA, Some("BOLD:AAB"), "gb"),
    ("vespa velutina", Some("BOLD:AAA"), "gb"),
    ("bombus terrestris", None, "gb"),
    ("bombus terrestris", Some("BOLD:YYY"), "gb"),
    ("bombus terrestris", Some("BOLD:YYY"), "gb"),
    ("apis mellifera", Some("BOLD:ZZZ"), "gb"),
];

/// Context over a store holding:
/// - `g1` vespa, with species `t1` vespa crabro (synonym `syn1` vespa crabro
///   germana) and `t2` vespa simillima (no specimens)
/// - the sixteen specimens above
pub async fn seeded_context(chunk_size: usize) -> MatchContext {
    let pool = init_memory_database().await.expect("Failed to create database");
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    insert_taxa(
        &mut conn,
        &[
            taxon("g1", "vespa", None),
            taxon("t1", CRABRO, Some("g1")),
            taxon("t2", "vespa simillima", Some("g1")),
        ],
    )
    .await
    .expect("Failed to insert taxa");

    insert_synonyms(
        &mut conn,
        &[SynonymRecord {
            id: "syn1".to_string(),
            name: GERMANA.to_string(),
            authorship: None,
            rank: "subspecies".to_string(),
            accepted_taxon_id: "t1".to_string(),
        }],
    )
    .await
    .expect("Failed to insert synonyms");

    let specimens: Vec<_> = SPECIMENS
        .iter()
        .enumerate()
        .map(|(i, (name, cluster, country))| SpecimenRecord {
            specimen_id: Some(format!("s{:02}", i + 1)),
            identification: Some(name.to_string()),
            cluster_id: cluster.map(String::from),
            country_iso: Some(country.to_string()),
            ..Default::default()
        })
        .collect();
    insert_specimens(&mut conn, &specimens)
        .await
        .expect("Failed to insert specimens");
    drop(conn);

    MatchContext::new(
        pool,
        BinsConfig {
            chunk_size,
            ..Default::default()
        },
    )
}

/// Specimen IDs of a list of specimens, in order
pub fn specimen_ids(specimens: &[SpecimenRecord]) -> Vec<&str> {
    specimens
        .iter()
        .map(|s| s.specimen_id.as_deref().unwrap_or_default())
        .collect()
}
