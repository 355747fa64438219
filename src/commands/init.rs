use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::AppConfig;

pub fn run(cfg: &AppConfig) -> Result<()> {
    // Opening the store creates the tables if they are missing
    super::open_store(cfg)?;

    println!(
        "{} Database ready at {}",
        "✓".green(),
        cfg.database_path.display()
    );

    Ok(())
}
