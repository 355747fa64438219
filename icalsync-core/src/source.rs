//! Source descriptors and the identity derived from them.
//!
//! A source locator is whatever the user typed: an http(s) or webcal URL, a
//! `file://` path, or a bare filesystem path. The planning identifier, the
//! fallback display name and the planning color are all derived from it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::constants::{PLANNING_COLORS, PLANNING_ID_PREFIX};
use crate::error::{IcalSyncError, IcalSyncResult};

/// Where a calendar feed is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
}

impl Source {
    /// Resolve a raw locator string into a source.
    ///
    /// `webcal://` and `webcals://` are fetched over https.
    pub fn parse(locator: &str) -> IcalSyncResult<Self> {
        let lower = locator.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(locator)
                .map_err(|e| IcalSyncError::Configuration(format!("Invalid URL '{locator}': {e}")))?;
            return Ok(Source::Url(url));
        }

        for scheme in ["webcals://", "webcal://"] {
            if lower.starts_with(scheme) {
                let rewritten = format!("https://{}", &locator[scheme.len()..]);
                let url = Url::parse(&rewritten).map_err(|e| {
                    IcalSyncError::Configuration(format!("Invalid URL '{locator}': {e}"))
                })?;
                return Ok(Source::Url(url));
            }
        }

        if lower.starts_with("file://") {
            return Ok(Source::File(PathBuf::from(&locator["file://".len()..])));
        }

        Ok(Source::File(PathBuf::from(locator)))
    }

    /// Display name used when neither a custom name nor X-WR-CALNAME is available.
    pub fn fallback_name(&self) -> String {
        match self {
            Source::Url(url) => {
                let host = url.host_str().unwrap_or_default();
                if host.contains("google.com") {
                    "Google Calendar".to_string()
                } else if host.contains("outlook.com") || host.contains("live.com") {
                    "Outlook Calendar".to_string()
                } else if host.contains("icloud.com") {
                    "iCloud Calendar".to_string()
                } else {
                    format!("Calendar from {host}")
                }
            }
            Source::File(path) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!("Calendar: {stem}")
            }
        }
    }

    /// Short origin label for planning descriptions.
    pub fn origin_label(&self) -> String {
        match self {
            Source::Url(url) => format!("Source: {}", url.host_str().unwrap_or_default()),
            Source::File(path) => format!("Source: Local file ({})", file_name(path)),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{url}"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// One calendar source to sync, as given on the command line or in a sync file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// Raw locator (URL, `file://` path, or bare path)
    #[serde(rename = "url")]
    pub locator: String,

    /// Display name override
    #[serde(default)]
    pub name: Option<String>,

    /// Planning identifier override
    #[serde(default)]
    pub custom_id: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceSpec {
    pub fn new(locator: impl Into<String>) -> Self {
        SourceSpec {
            locator: locator.into(),
            name: None,
            custom_id: None,
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_custom_id(mut self, id: impl Into<String>) -> Self {
        self.custom_id = Some(id.into());
        self
    }

    /// Planning identifier: the custom one if set, otherwise derived from the locator.
    pub fn planning_id(&self) -> String {
        match self.custom_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => planning_id_for(&self.locator),
        }
    }

    pub fn custom_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// `ical-` followed by the first 12 hex chars of the locator's SHA-256.
pub fn planning_id_for(locator: &str) -> String {
    let digest = Sha256::digest(locator.as_bytes());
    let hex = hex::encode(digest);
    format!("{}{}", PLANNING_ID_PREFIX, &hex[..12])
}

/// Pick a palette color for a planning, stable for a given identifier.
pub fn color_for(planning_id: &str) -> String {
    let digest = Sha256::digest(planning_id.as_bytes());
    let index = digest[0] as usize % PLANNING_COLORS.len();
    PLANNING_COLORS[index].to_string()
}
