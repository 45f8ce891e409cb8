//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity types held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Taxon,
    Synonym,
    Specimen,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Taxon => "Taxon",
            Entity::Synonym => "Synonym",
            Entity::Specimen => "Specimen",
        })
    }
}

/// Accepted taxon in the reference hierarchy
///
/// `name` and `rank` are stored lowercase. `parent_id` is `None` only for
/// roots and always resolves within the same generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaxonNode {
    pub id: String,
    pub name: String,
    pub authorship: Option<String>,
    pub rank: String,
    pub parent_id: Option<String>,
}

/// Non-accepted name pointing at an accepted taxon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SynonymRecord {
    pub id: String,
    pub name: String,
    pub authorship: Option<String>,
    pub rank: String,
    #[sqlx(rename = "taxon_id")]
    pub accepted_taxon_id: String,
}

/// Occurrence record imported from a barcode snapshot
///
/// `id` is assigned by the store and ignored on insert. `cluster_id` is the
/// barcode index number (BIN) the specimen's sequence was clustered into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpecimenRecord {
    pub id: i64,
    pub specimen_id: Option<String>,
    pub process_id: Option<String>,
    pub identification: Option<String>,
    pub identification_rank: Option<String>,
    pub cluster_id: Option<String>,
    pub country_iso: Option<String>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub subfamily: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
}

/// Species traits row from a PANTHEON snapshot
///
/// `id` is assigned by the store and ignored on insert. Values are stored as
/// found in the snapshot; blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PantheonSpecies {
    pub id: i64,
    pub species: Option<String>,
    pub family: Option<String>,
    pub order: Option<String>,
    pub sqs: Option<String>,
    pub conservation_status: Option<String>,
    pub larval_feeding_guild: Option<String>,
    pub adult_feeding_guild: Option<String>,
    pub broad_biotope: Option<String>,
    pub habitat: Option<String>,
    pub resources: Option<String>,
    pub specific_assemblage_type: Option<String>,
    pub habitat_score: Option<String>,
    pub associations: Option<String>,
    pub common_name: Option<String>,
    pub notes: Option<String>,
}

/// When and how much data was last imported from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataSourceStatus {
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub version: Option<String>,
    pub total: i64,
}
