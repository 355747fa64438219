pub mod import;
pub mod init;
pub mod stats;
pub mod sync;

use anyhow::{Context, Result};
use icalsync_core::sync::{Importer, Overrides, SyncOptions, validate_sources};
use icalsync_core::{MemoryStore, RunReport, SourceFetcher, SourceSpec, SqliteStore, Store};

use crate::config::AppConfig;
use crate::render::Render;

/// Global flags that shape an import run.
#[derive(Debug, Clone, Copy)]
pub struct RunFlags {
    pub dry_run: bool,
    pub json: bool,
}

pub fn open_store(cfg: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("Failed to open database at {}", cfg.database_path.display()))
}

/// Run the import pipeline over `specs` and print the report.
///
/// Only configuration problems make this fail. Sources that could not be
/// synced are listed in the report.
pub async fn run_sources(
    cfg: &AppConfig,
    specs: &[SourceSpec],
    overrides: &Overrides,
    sync_delete: bool,
    flags: RunFlags,
) -> Result<()> {
    validate_sources(specs, overrides)?;

    let report = run_pipeline(cfg, specs, overrides, cfg.sync_options(sync_delete, flags.dry_run)).await?;

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }

    Ok(())
}

/// Pick the store for this run. Dry runs never create or write the database.
async fn run_pipeline(
    cfg: &AppConfig,
    specs: &[SourceSpec],
    overrides: &Overrides,
    options: SyncOptions,
) -> Result<RunReport> {
    if !options.dry_run {
        return import(cfg, open_store(cfg)?, specs, overrides, options).await;
    }

    if cfg.database_path.exists() {
        let store = SqliteStore::open_read_only(&cfg.database_path)
            .with_context(|| format!("Failed to open database at {}", cfg.database_path.display()))?;
        import(cfg, store, specs, overrides, options).await
    } else {
        tracing::debug!(path = %cfg.database_path.display(), "No database yet, planning against an empty store");
        import(cfg, MemoryStore::new(), specs, overrides, options).await
    }
}

async fn import<S: Store>(
    cfg: &AppConfig,
    store: S,
    specs: &[SourceSpec],
    overrides: &Overrides,
    options: SyncOptions,
) -> Result<RunReport> {
    let fetcher = SourceFetcher::new(cfg.fetch_timeout()?)?;
    let mut importer = Importer::new(fetcher, store, options);

    Ok(importer.run(specs, overrides).await?)
}
