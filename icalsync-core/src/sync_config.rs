//! Multi-source sync file.
//!
//! ```toml
//! [[calendars]]
//! name = "Team"
//! url = "https://calendar.google.com/calendar/ical/team/basic.ics"
//!
//! [[calendars]]
//! name = "Holidays"
//! url = "webcal://example.org/holidays.ics"
//! enabled = false
//! custom_id = "holidays"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::source::SourceSpec;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub calendars: Vec<SourceSpec>,
}

impl SyncConfig {
    pub fn load(path: &Path) -> IcalSyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IcalSyncError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> IcalSyncResult<Self> {
        let config: SyncConfig =
            toml::from_str(content).map_err(|e| IcalSyncError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> IcalSyncResult<()> {
        for (i, entry) in self.calendars.iter().enumerate() {
            if entry.custom_name().is_none() {
                return Err(IcalSyncError::Configuration(format!(
                    "Calendar #{} ({}) is missing a name",
                    i + 1,
                    entry.locator
                )));
            }
            if entry.locator.trim().is_empty() {
                return Err(IcalSyncError::Configuration(format!(
                    "Calendar '{}' is missing a url",
                    entry.name.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}
