//! Application configuration.
//!
//! Layered with the `config` crate: built-in defaults, then the TOML file
//! (`--config`, or ~/.config/icalsync/config.toml when present), then
//! `ICALSYNC_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use icalsync_core::constants::{DEFAULT_HORIZON_YEARS, DEFAULT_MAX_OCCURRENCES};
use icalsync_core::recurrence::ExpansionLimits;
use icalsync_core::sync::SyncOptions;
use serde::Deserialize;

const DEFAULT_FETCH_TIMEOUT: &str = "30s";
const DEFAULT_FETCH_CONCURRENCY: i64 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Per-request timeout for URL sources (e.g. "30s", "2m")
    pub fetch_timeout: String,

    pub fetch_concurrency: usize,

    pub max_occurrences: usize,

    pub horizon_years: u32,

    /// Keep a planning's existing color when it is re-synced
    pub preserve_color: bool,
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("icalsync").join("config.toml"))
    }

    fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("icalsync"))
            .unwrap_or_default()
            .join("icalsync.db")
    }

    /// Load configuration. An explicit `path` must exist; the default one may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(File::from(path).format(FileFormat::Toml).required(true)),
            None => Self::config_path().map(|p| File::from(p).format(FileFormat::Toml).required(false)),
        };

        let mut builder = Config::builder()
            .set_default(
                "database_path",
                Self::default_database_path().to_string_lossy().to_string(),
            )?
            .set_default("fetch_timeout", DEFAULT_FETCH_TIMEOUT)?
            .set_default("fetch_concurrency", DEFAULT_FETCH_CONCURRENCY)?
            .set_default("max_occurrences", DEFAULT_MAX_OCCURRENCES as i64)?
            .set_default("horizon_years", i64::from(DEFAULT_HORIZON_YEARS))?
            .set_default("preserve_color", true)?;

        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        let config: AppConfig = builder
            .add_source(Environment::with_prefix("ICALSYNC").try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        // Fail on a bad timeout at startup rather than on first fetch
        config.fetch_timeout()?;

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.fetch_timeout)
            .with_context(|| format!("Invalid fetch_timeout '{}'", self.fetch_timeout))
    }

    pub fn sync_options(&self, sync_delete: bool, dry_run: bool) -> SyncOptions {
        SyncOptions {
            sync_delete,
            dry_run,
            preserve_color: self.preserve_color,
            limits: ExpansionLimits {
                max_occurrences: self.max_occurrences,
                horizon_years: self.horizon_years,
            },
            fetch_concurrency: self.fetch_concurrency,
        }
    }
}
