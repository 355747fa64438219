use anyhow::Result;
use icalsync_core::Store;
use owo_colors::OwoColorize;

use crate::config::AppConfig;

pub fn run(cfg: &AppConfig) -> Result<()> {
    let store = super::open_store(cfg)?;

    let plannings = store.count_plannings()?;
    let events = store.count_events()?;

    println!("{}", cfg.database_path.display().dimmed());
    println!("   Plannings: {}", plannings.bold());
    println!("   Events:    {}", events.bold());

    Ok(())
}
