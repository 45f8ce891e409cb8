//! ukbol-sync - Taxonomy and specimen rebuild tool
//!
//! Each command runs one full-replace rebuild to completion. Running two
//! rebuilds against the same database at once is not supported.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ukbol_common::config::{
    load_config, resolve_database_path, CONFIG_ENV_VAR, DATABASE_ENV_VAR, PANTHEON_VERSION_ENV_VAR,
};
use ukbol_common::db::{init_database, status::list_status};
use ukbol_sync::sources::{ArchiveSource, FieldMapping, NbnSource, RecordSource, TsvSource};
use ukbol_sync::{rebuild_pantheon, rebuild_specimens, rebuild_taxonomy, RebuildContext};

/// Command-line arguments for ukbol-sync
#[derive(Parser, Debug)]
#[command(name = "ukbol-sync")]
#[command(about = "Rebuild the UKBoL taxonomy, specimen and species traits tables")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = DATABASE_ENV_VAR)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the taxon and synonym tables (NBN feed unless a file is given)
    RebuildTaxonomy {
        /// Darwin Core style .tar.gz archive
        #[arg(long, conflicts_with = "tsv")]
        archive: Option<PathBuf>,

        /// Archive member holding the taxon rows
        #[arg(long, default_value = "taxon.txt", requires = "archive")]
        member: String,

        /// Plain TSV file with Darwin Core column names
        #[arg(long)]
        tsv: Option<PathBuf>,
    },

    /// Replace the specimen table from a barcode snapshot (.tar.gz)
    RebuildSpecimens {
        archive: PathBuf,
    },

    /// Replace the PANTHEON species traits table from a CSV snapshot
    RebuildPantheon {
        csv: PathBuf,

        /// Version label recorded with the import
        #[arg(long, env = PANTHEON_VERSION_ENV_VAR)]
        data_version: Option<String>,
    },

    /// Show when each data source was last imported
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;
    let ctx = RebuildContext::new(pool, config);

    let outcome = run(&ctx, args.command).await;
    ctx.close().await;
    outcome
}

async fn run(ctx: &RebuildContext, command: Command) -> Result<()> {
    match command {
        Command::RebuildTaxonomy { archive, member, tsv } => {
            let source: Box<dyn RecordSource> = match (archive, tsv) {
                (Some(path), _) => Box::new(ArchiveSource::new(path, member, FieldMapping::dwca())),
                (None, Some(path)) => Box::new(TsvSource::new(path, FieldMapping::dwca())),
                (None, None) => Box::new(
                    NbnSource::new(&ctx.config().nbn).context("Failed to create NBN client")?,
                ),
            };
            let report = rebuild_taxonomy(ctx, source.as_ref())
                .await
                .context("Taxonomy rebuild failed")?;
            info!(
                taxa = report.taxa_written,
                synonyms = report.synonyms_written,
                synonyms_dropped = report.synonyms_dropped,
                "UKSI derived tables rebuilt"
            );
        }
        Command::RebuildSpecimens { archive } => {
            let report = rebuild_specimens(ctx, &archive)
                .await
                .context("Specimen import failed")?;
            info!(member = %report.member, written = report.written, "Specimen table rebuilt");
        }
        Command::RebuildPantheon { csv, data_version } => {
            let version = data_version.or_else(|| ctx.config().pantheon.data_version.clone());
            let report = rebuild_pantheon(ctx, &csv, version.as_deref())
                .await
                .context("PANTHEON import failed")?;
            info!(written = report.written, removed = report.removed, "PANTHEON table rebuilt");
        }
        Command::Status => {
            for row in list_status(ctx.pool()).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.name,
                    row.updated_at.to_rfc3339(),
                    row.total,
                    row.version.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}
