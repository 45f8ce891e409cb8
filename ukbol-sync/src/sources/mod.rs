//! Record sources
//!
//! A source yields raw field→string mappings lazily. Re-invoking
//! [`RecordSource::records`] restarts the sequence from the beginning; there
//! is no random access.

pub mod csv;
pub mod nbn;
pub mod tsv;

pub use csv::CsvRows;
pub use nbn::NbnSource;
pub use tsv::{ArchiveSource, TsvRows, TsvSource};

use crate::error::Result;
use futures::stream::LocalBoxStream;
use ukbol_common::fields::RawRecord;

/// Lazy record sequence
///
/// Archive-backed streams borrow the open archive, so the stream is not
/// `Send`; the rebuild drives it on the current task.
pub type RecordStream<'a> = LocalBoxStream<'a, Result<RawRecord>>;

pub trait RecordSource {
    /// Short description for logs and errors
    fn describe(&self) -> String;

    /// Field names this source uses for the taxon identity fields
    fn mapping(&self) -> FieldMapping;

    /// Start a fresh pass over the source
    fn records(&self) -> RecordStream<'_>;
}

/// Names of the raw fields carrying each taxon identity value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub id: &'static str,
    pub name: &'static str,
    pub authorship: &'static str,
    pub rank: &'static str,
    /// Taxonomic status; synonyms contain "synonym"
    pub status: &'static str,
    pub parent_id: &'static str,
    /// Accepted taxon of a synonym
    pub accepted_id: &'static str,
    /// Field naming the record's originating dataset, if the source has one
    pub info_source: Option<&'static str>,
}

impl FieldMapping {
    /// NBN Atlas species search results
    pub const fn nbn() -> Self {
        Self {
            id: "guid",
            name: "scientificName",
            authorship: "scientificNameAuthorship",
            rank: "rank",
            status: "taxonomicStatus",
            parent_id: "parentGuid",
            accepted_id: "acceptedConceptID",
            info_source: Some("infoSourceName"),
        }
    }

    /// Darwin Core Archive taxon core
    pub const fn dwca() -> Self {
        Self {
            id: "taxonID",
            name: "scientificName",
            authorship: "scientificNameAuthorship",
            rank: "taxonRank",
            status: "taxonomicStatus",
            parent_id: "parentNameUsageID",
            accepted_id: "acceptedNameUsageID",
            info_source: None,
        }
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::dwca()
    }
}
