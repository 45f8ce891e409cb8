//! Cluster-based associative matching
//!
//! Matching runs in two steps: the taxon's name-closure selects the clusters
//! its specimens were placed in, then every specimen in those clusters is
//! returned, whatever name it was identified under.

use crate::closure::name_closure;
use crate::MatchContext;
use futures::stream::TryChunksError;
use futures::{Stream, TryStreamExt};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::debug;
use ukbol_common::db::{specimens, SpecimenRecord, TaxonNode};
use ukbol_common::Result;

/// Distinct cluster IDs of specimens identified as any name in the taxon's closure
///
/// Specimens without a cluster never contribute. An unmatched taxon yields
/// an empty set.
pub async fn cluster_ids_for(ctx: &MatchContext, taxon: &TaxonNode) -> Result<BTreeSet<String>> {
    let names = name_closure(ctx.pool(), taxon).await?;
    let clusters = specimens::distinct_cluster_ids(ctx.pool(), &names).await?;
    debug!(
        taxon = %taxon.id,
        names = names.len(),
        clusters = clusters.len(),
        "Resolved taxon clusters"
    );
    Ok(clusters)
}

/// Every specimen sharing a cluster with the taxon's matches
pub async fn specimens_in_clusters_of(
    ctx: &MatchContext,
    taxon: &TaxonNode,
) -> Result<AssociatedSpecimens> {
    let clusters = cluster_ids_for(ctx, taxon).await?;
    Ok(AssociatedSpecimens {
        pool: ctx.pool().clone(),
        clusters,
    })
}

/// The specimens in a fixed set of clusters
///
/// Holds only the cluster set; specimens are fetched when one of the
/// accessors is called, and each call starts from the beginning again.
#[derive(Debug, Clone)]
pub struct AssociatedSpecimens {
    pool: SqlitePool,
    clusters: BTreeSet<String>,
}

impl AssociatedSpecimens {
    pub fn clusters(&self) -> &BTreeSet<String> {
        &self.clusters
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Stream the specimens ordered by (cluster_id, id)
    ///
    /// Each cluster's specimens form one contiguous run, so callers can group
    /// consecutive records without sorting.
    pub fn stream(&self) -> impl Stream<Item = Result<SpecimenRecord>> + '_ {
        specimens::specimens_in_clusters(&self.pool, &self.clusters)
    }

    /// The same sequence as [`Self::stream`], delivered in chunks of `chunk_size`
    ///
    /// Only the last chunk may be shorter.
    pub fn specimen_chunks(
        &self,
        chunk_size: usize,
    ) -> impl Stream<Item = Result<Vec<SpecimenRecord>>> + '_ {
        self.stream()
            .try_chunks(chunk_size.max(1))
            .map_err(|TryChunksError(_, err)| err)
    }

    pub async fn count(&self) -> Result<i64> {
        specimens::count_specimens_in_clusters(&self.pool, &self.clusters).await
    }

    /// One LIMIT/OFFSET window of [`Self::stream`]'s ordering
    pub async fn page(&self, limit: i64, offset: i64) -> Result<Vec<SpecimenRecord>> {
        specimens::specimens_in_clusters_page(&self.pool, &self.clusters, limit, offset).await
    }
}
