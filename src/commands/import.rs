use anyhow::Result;
use icalsync_core::SourceSpec;
use icalsync_core::sync::Overrides;

use crate::config::AppConfig;

pub async fn run(
    cfg: &AppConfig,
    locators: Vec<String>,
    overrides: Overrides,
    sync_delete: bool,
    flags: super::RunFlags,
) -> Result<()> {
    let specs: Vec<SourceSpec> = locators.into_iter().map(SourceSpec::new).collect();

    super::run_sources(cfg, &specs, &overrides, sync_delete, flags).await
}
