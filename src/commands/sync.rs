use std::path::Path;

use anyhow::Result;
use icalsync_core::SyncConfig;
use icalsync_core::sync::Overrides;
use owo_colors::OwoColorize;

use crate::config::AppConfig;

pub async fn run(cfg: &AppConfig, file: &Path, sync_delete: bool, flags: super::RunFlags) -> Result<()> {
    let sync_config = SyncConfig::load(file)?;

    if sync_config.calendars.is_empty() {
        println!(
            "{}",
            format!("No calendars configured in {}", file.display()).dimmed()
        );
        println!("\nAdd one with:\n\n[[calendars]]\nname = \"Team\"\nurl = \"https://example.com/team.ics\"");
        return Ok(());
    }

    super::run_sources(
        cfg,
        &sync_config.calendars,
        &Overrides::default(),
        sync_delete,
        flags,
    )
    .await
}
