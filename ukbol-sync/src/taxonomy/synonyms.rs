//! Synonym resolution against the surviving forest

use super::filter::Forest;
use tracing::debug;
use ukbol_common::db::SynonymRecord;

/// Synonyms split by whether their accepted taxon survived filtering
#[derive(Debug, Default)]
pub struct ResolvedSynonyms {
    /// Kept synonyms, in source order
    pub kept: Vec<SynonymRecord>,
    pub dropped: usize,
}

/// Keep only synonyms whose accepted taxon is in `forest`
///
/// Must run after filtering: an accepted taxon present in the source may still
/// have been dropped by the rank or species rules.
pub fn resolve_synonyms(synonyms: &[SynonymRecord], forest: &Forest) -> ResolvedSynonyms {
    let mut resolved = ResolvedSynonyms::default();
    for synonym in synonyms {
        if forest.contains(&synonym.accepted_taxon_id) {
            resolved.kept.push(synonym.clone());
        } else {
            debug!(
                id = %synonym.id,
                accepted_taxon_id = %synonym.accepted_taxon_id,
                "Dropping synonym of unknown taxon"
            );
            resolved.dropped += 1;
        }
    }
    resolved
}
