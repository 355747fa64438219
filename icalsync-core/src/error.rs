//! Error types for the icalsync ingestion pipeline.

use thiserror::Error;

/// Errors that can occur while importing and reconciling calendar feeds.
///
/// The variants map onto how far a failure propagates: `DateParse`,
/// `RecurrenceRule` and `Persistence` are absorbed per event, `Fetch`, `Read`
/// and `Parse` abort a single source, and `Configuration` aborts the run.
#[derive(Error, Debug)]
pub enum IcalSyncError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("ICS parse error: {0}")]
    Parse(String),

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Recurrence rule error: {0}")]
    RecurrenceRule(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for IcalSyncError {
    fn from(e: rusqlite::Error) -> Self {
        IcalSyncError::Persistence(e.to_string())
    }
}

/// Result type alias for icalsync operations.
pub type IcalSyncResult<T> = Result<T, IcalSyncError>;
