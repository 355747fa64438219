mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use icalsync_core::sync::Overrides;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "icalsync")]
#[command(about = "Import iCal feeds into plannings and keep them in sync")]
struct Cli {
    /// Config file (defaults to ~/.config/icalsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show what would change without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the run report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one or more feeds (URL, webcal://, file:// or local path)
    Import {
        #[arg(required = true)]
        sources: Vec<String>,

        /// Planning name (single source only)
        #[arg(long)]
        name: Option<String>,

        /// Planning identifier (single source only)
        #[arg(long)]
        id: Option<String>,

        /// Delete events that disappeared from the feed
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
        sync_delete: bool,
    },
    /// Sync every calendar listed in a TOML sources file
    Sync {
        file: PathBuf,

        /// Delete events that disappeared from the feed
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
        sync_delete: bool,
    },
    /// Create the database tables
    Init,
    /// Show planning and event counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let cfg = AppConfig::load(cli.config.as_deref())?;
    let flags = commands::RunFlags {
        dry_run: cli.dry_run,
        json: cli.json,
    };

    match cli.command {
        Commands::Import {
            sources,
            name,
            id,
            sync_delete,
        } => {
            let overrides = Overrides {
                name,
                planning_id: id,
            };
            commands::import::run(&cfg, sources, overrides, sync_delete, flags).await
        }
        Commands::Sync { file, sync_delete } => {
            commands::sync::run(&cfg, &file, sync_delete, flags).await
        }
        Commands::Init => commands::init::run(&cfg),
        Commands::Stats => commands::stats::run(&cfg),
    }
}

/// Logs go to stderr so the rendered report on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,icalsync=debug,icalsync_core=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
