use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::DiffKind;
use crate::event::Event;

/// One classified change. `old` is the persisted row, `new` the desired one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventDiff {
    Create { new: Event },
    Update { old: Event, new: Event },
    Delete { old: Event },
}

impl fmt::Display for EventDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind(), self.event(), self.uid())
    }
}

impl EventDiff {
    /// Compare a persisted and a desired version of the same event.
    ///
    /// Returns `None` when nothing needs to change.
    pub fn get_diff(old_event: Option<Event>, new_event: Option<Event>) -> Option<EventDiff> {
        match (old_event, new_event) {
            (None, Some(new)) => Some(EventDiff::Create { new }),
            (Some(old), None) => Some(EventDiff::Delete { old }),
            (Some(old), Some(new)) => {
                if old.same_content(&new) {
                    None
                } else {
                    Some(EventDiff::Update { old, new })
                }
            }
            (None, None) => None,
        }
    }

    pub fn kind(&self) -> DiffKind {
        match self {
            EventDiff::Create { .. } => DiffKind::Create,
            EventDiff::Update { .. } => DiffKind::Update,
            EventDiff::Delete { .. } => DiffKind::Delete,
        }
    }

    /// The event this diff is about (desired version when there is one).
    pub fn event(&self) -> &Event {
        match self {
            EventDiff::Create { new } | EventDiff::Update { new, .. } => new,
            EventDiff::Delete { old } => old,
        }
    }

    pub fn uid(&self) -> &str {
        &self.event().uid
    }
}
