//! Persisted record types.
//!
//! A `Planning` is the sync boundary for one external calendar source, and
//! every `Event` belongs to exactly one planning. Both are plain data: the
//! reconciliation engine decides how they change, the store only saves them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of events, one per external calendar source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planning {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A single scheduled occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// UID from the feed (or generated), suffixed for recurrence instances
    pub uid: String,
    pub planning_id: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Preserved across updates
    pub created: DateTime<Utc>,
    /// Refreshed on every update
    pub last_modified: DateTime<Utc>,
}

impl Event {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when every field a feed can change is equal.
    ///
    /// Bookkeeping timestamps (`created`, `last_modified`) are ignored.
    pub fn same_content(&self, other: &Event) -> bool {
        self.summary == other.summary
            && self.description == other.description
            && self.location == other.location
            && self.start == other.start
            && self.end == other.end
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.is_empty() {
            write!(f, "(No title)")
        } else {
            write!(f, "{}", self.summary)
        }
    }
}

impl fmt::Display for Planning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
