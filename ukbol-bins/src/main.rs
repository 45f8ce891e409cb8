//! ukbol-bins - Query the specimens associated with a taxon through barcode clusters
//!
//! Results go to stdout (JSON, or CSV for `export`); logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ukbol_bins::db::{connect_readonly, load_taxon};
use ukbol_bins::{
    associated_specimens, cluster_ids_for, specimens_named, summarize, write_cluster_csv,
    MatchContext,
};
use ukbol_common::config::{load_config, resolve_database_path, CONFIG_ENV_VAR, DATABASE_ENV_VAR};

/// Command-line arguments for ukbol-bins
#[derive(Parser, Debug)]
#[command(name = "ukbol-bins")]
#[command(about = "Match specimens to UKBoL taxa through barcode clusters")]
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
    /// List the clusters the taxon's specimens were placed in
    Clusters { taxon_id: String },

    /// Summarize each cluster: size, local count and names used
    Summary { taxon_id: String },

    /// Page through specimens identified under the taxon's names
    Specimens {
        taxon_id: String,

        #[arg(long)]
        page: Option<i64>,

        #[arg(long)]
        per_page: Option<i64>,

        /// List every specimen in the taxon's clusters instead
        #[arg(long)]
        associated: bool,
    },

    /// Write every specimen in the taxon's clusters as CSV
    Export { taxon_id: String },
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
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());
    let pool = connect_readonly(&db_path).await?;
    let ctx = MatchContext::new(pool, config.bins);

    let outcome = run(&ctx, args.command).await;
    ctx.close().await;
    outcome
}

async fn run(ctx: &MatchContext, command: Command) -> Result<()> {
    match command {
        Command::Clusters { taxon_id } => {
            let taxon = load_taxon(ctx.pool(), &taxon_id).await?;
            for cluster_id in cluster_ids_for(ctx, &taxon).await? {
                println!("{}", cluster_id);
            }
        }
        Command::Summary { taxon_id } => {
            let taxon = load_taxon(ctx.pool(), &taxon_id).await?;
            let summaries = summarize(ctx, &taxon).await?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Specimens {
            taxon_id,
            page,
            per_page,
            associated,
        } => {
            let taxon = load_taxon(ctx.pool(), &taxon_id).await?;
            let listing = if associated {
                associated_specimens(ctx, &taxon, page, per_page).await?
            } else {
                specimens_named(ctx, &taxon, page, per_page).await?
            };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Export { taxon_id } => {
            let taxon = load_taxon(ctx.pool(), &taxon_id).await?;
            let mut stdout = tokio::io::stdout();
            write_cluster_csv(ctx, &taxon, &mut stdout)
                .await
                .context("CSV export failed")?;
        }
    }
    Ok(())
}
