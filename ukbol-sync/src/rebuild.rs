//! Full-replace taxonomy rebuild
//!
//! The source is read completely and the new generation planned in memory
//! before the store is touched; every fatal source problem therefore leaves
//! the previous generation in place. Once writing starts, the old generation
//! is deleted in one transaction and the new one inserted batch by batch.

use crate::error::{Result, SyncError};
use crate::sources::RecordSource;
use crate::taxonomy::{
    apply_filter, resolve_synonyms, BuildStats, EmissionPlan, FilterStats, GraphBuilder,
};
use futures::TryStreamExt;
use sqlx::SqlitePool;
use tracing::info;
use ukbol_common::config::TomlConfig;
use ukbol_common::db::{status, synonyms, taxa};

/// Status row names
pub const TAXA_STATUS: &str = "uksi-taxa";
pub const SYNONYM_STATUS: &str = "uksi-synonym";

const PROGRESS_INTERVAL: u64 = 10_000;

/// Everything a sync run needs, passed explicitly to each operation
#[derive(Debug, Clone)]
pub struct RebuildContext {
    pool: SqlitePool,
    config: TomlConfig,
}

impl RebuildContext {
    pub fn new(pool: SqlitePool, config: TomlConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    /// Close the pool, waiting for open connections to be returned
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Outcome of a taxonomy rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub build: BuildStats,
    pub filter: FilterStats,
    pub synonyms_dropped: usize,
    pub taxa_written: u64,
    pub synonyms_written: u64,
}

/// Replace the stored taxonomy with the one read from `source`
pub async fn rebuild_taxonomy(ctx: &RebuildContext, source: &dyn RecordSource) -> Result<RebuildReport> {
    let taxonomy = &ctx.config().taxonomy;
    let description = source.describe();
    info!(source = %description, "Rebuilding taxonomy");

    let mut builder = GraphBuilder::new(source.mapping(), taxonomy.info_source.clone());
    let mut records = source.records();
    let mut seen: u64 = 0;
    while let Some(record) = records.try_next().await? {
        builder.push(&record);
        seen += 1;
        if seen % PROGRESS_INTERVAL == 0 {
            info!(records = seen, "Building taxonomy graph");
        }
    }
    drop(records);

    let graph = builder.finish();
    let build = graph.stats().clone();
    info!(
        records = build.records,
        nodes = graph.len(),
        edges = build.edges,
        synonyms = build.synonyms,
        malformed = build.malformed,
        foreign = build.foreign,
        duplicates = build.duplicates,
        dangling_parents = build.dangling_parents,
        "Graph creation complete"
    );
    if graph.is_empty() {
        return Err(SyncError::EmptySource(description));
    }

    let (forest, filter) = apply_filter(&graph, taxonomy)?;
    info!(
        kept = forest.len(),
        dropped = filter.dropped,
        excluded_rank = filter.excluded_rank,
        misplaced_species = filter.misplaced_species,
        truncated = filter.truncated,
        roots = forest.roots().len(),
        "Filtering complete"
    );

    let resolved = resolve_synonyms(graph.synonyms(), &forest);
    let plan = EmissionPlan::new(&forest, resolved.kept, taxonomy.batch_size);
    drop(graph);

    let (taxa_written, synonyms_written) = write_generation(ctx.pool(), &plan).await?;

    let taxon_count = taxa::count_taxa(ctx.pool()).await?;
    let synonym_count = synonyms::count_synonyms(ctx.pool()).await?;
    status::update_status(ctx.pool(), TAXA_STATUS, taxon_count, None).await?;
    status::update_status(ctx.pool(), SYNONYM_STATUS, synonym_count, None).await?;
    info!(taxa = taxon_count, synonyms = synonym_count, "Taxonomy rebuilt");

    Ok(RebuildReport {
        build,
        filter,
        synonyms_dropped: resolved.dropped,
        taxa_written,
        synonyms_written,
    })
}

/// Delete the previous generation, then insert the planned one in order
async fn write_generation(pool: &SqlitePool, plan: &EmissionPlan) -> Result<(u64, u64)> {
    info!("Removing existing taxonomy");
    let mut tx = pool.begin().await?;
    let removed_synonyms = synonyms::delete_all_synonyms(&mut tx).await?;
    let removed_taxa = taxa::delete_all_taxa(&mut tx).await?;
    tx.commit().await?;
    info!(taxa = removed_taxa, synonyms = removed_synonyms, "Existing taxonomy removed");

    info!(total = plan.taxa().len(), "Writing taxa");
    let mut taxa_written = 0;
    for batch in plan.taxon_batches() {
        let mut tx = pool.begin().await?;
        taxa_written += taxa::insert_taxa(&mut tx, batch).await?;
        tx.commit().await?;
    }

    info!(total = plan.synonyms().len(), "Writing synonyms");
    let mut synonyms_written = 0;
    for batch in plan.synonym_batches() {
        let mut tx = pool.begin().await?;
        synonyms_written += synonyms::insert_synonyms(&mut tx, batch).await?;
        tx.commit().await?;
    }

    Ok((taxa_written, synonyms_written))
}
