//! Paged specimen listings for a taxon

use crate::closure::name_closure;
use crate::matcher::specimens_in_clusters_of;
use crate::MatchContext;
use serde::Serialize;
use ukbol_common::db::{specimens, SpecimenRecord, TaxonNode};
use ukbol_common::pagination::Pagination;
use ukbol_common::Result;

/// One page of a listing plus the size of the whole listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecimenPage {
    pub count: i64,
    pub specimens: Vec<SpecimenRecord>,
}

/// Specimens identified under any name in the taxon's closure
///
/// Ordered by (identification, id). Pages are 1-indexed and `per_page` is
/// clamped, see [`Pagination`].
pub async fn specimens_named(
    ctx: &MatchContext,
    taxon: &TaxonNode,
    page: Option<i64>,
    per_page: Option<i64>,
) -> Result<SpecimenPage> {
    let paging = Pagination::new(page, per_page);
    let names = name_closure(ctx.pool(), taxon).await?;

    let count = specimens::count_specimens_named(ctx.pool(), &names).await?;
    let specimens =
        specimens::specimens_named(ctx.pool(), &names, paging.per_page, paging.offset).await?;
    Ok(SpecimenPage { count, specimens })
}

/// Specimens sharing a cluster with the taxon's matches, ordered by (cluster_id, id)
pub async fn associated_specimens(
    ctx: &MatchContext,
    taxon: &TaxonNode,
    page: Option<i64>,
    per_page: Option<i64>,
) -> Result<SpecimenPage> {
    let paging = Pagination::new(page, per_page);
    let associated = specimens_in_clusters_of(ctx, taxon).await?;

    let count = associated.count().await?;
    let specimens = associated.page(paging.per_page, paging.offset).await?;
    Ok(SpecimenPage { count, specimens })
}
