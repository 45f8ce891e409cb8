//! Name-closure of a taxon

use sqlx::SqlitePool;
use std::collections::BTreeSet;
use ukbol_common::db::{synonyms, TaxonNode};
use ukbol_common::Result;

/// The taxon's own name plus the names of all its synonyms
///
/// Names are already lowercase in the store, so the closure can be matched
/// against specimen identifications directly.
pub async fn name_closure(pool: &SqlitePool, taxon: &TaxonNode) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    names.insert(taxon.name.clone());
    names.extend(
        synonyms::synonyms_of(pool, &taxon.id)
            .await?
            .into_iter()
            .map(|synonym| synonym.name),
    );
    Ok(names)
}
