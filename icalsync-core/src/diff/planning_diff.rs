//! Diff computation for one planning.
//!
//! The diff is pure: it reads the persisted and desired event sets and decides
//! what should happen. Dry runs report it, live runs apply it, so the two can
//! never disagree on classification.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::diff::{DiffKind, EventDiff};
use crate::event::Event;

/// Everything that reconciling one planning would change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningDiff {
    pub planning_id: String,
    /// Deletions first, then creates and updates in feed order
    pub diffs: Vec<EventDiff>,
    /// Desired events already persisted with identical content
    pub unchanged: usize,
}

impl PlanningDiff {
    /// Classify `desired` against `persisted` for one planning.
    ///
    /// With `sync_delete` off, persisted events missing from `desired` are
    /// left alone. Duplicate UIDs in `desired` collapse to the last one.
    pub fn compute(
        planning_id: &str,
        persisted: Vec<Event>,
        desired: Vec<Event>,
        sync_delete: bool,
    ) -> Self {
        let desired = dedup_by_uid(desired);

        let mut persisted_by_uid: HashMap<String, Event> = HashMap::new();
        let mut persisted_order = Vec::with_capacity(persisted.len());
        for event in persisted {
            persisted_order.push(event.uid.clone());
            persisted_by_uid.insert(event.uid.clone(), event);
        }

        let mut diffs = Vec::new();

        if sync_delete {
            let desired_uids: HashSet<&str> = desired.iter().map(|e| e.uid.as_str()).collect();
            for uid in &persisted_order {
                if desired_uids.contains(uid.as_str()) {
                    continue;
                }
                if let Some(old) = persisted_by_uid.remove(uid) {
                    diffs.extend(EventDiff::get_diff(Some(old), None));
                }
            }
        }

        let mut unchanged = 0;
        for new in desired {
            let old = persisted_by_uid.remove(&new.uid);
            match EventDiff::get_diff(old, Some(new)) {
                Some(diff) => diffs.push(diff),
                None => unchanged += 1,
            }
        }

        PlanningDiff {
            planning_id: planning_id.to_string(),
            diffs,
            unchanged,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// UIDs classified as `kind`, in diff order.
    pub fn uids(&self, kind: DiffKind) -> Vec<String> {
        self.diffs
            .iter()
            .filter(|d| d.kind() == kind)
            .map(|d| d.uid().to_string())
            .collect()
    }

    /// (created, updated, deleted)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut created = 0;
        let mut updated = 0;
        let mut deleted = 0;

        for diff in &self.diffs {
            match diff.kind() {
                DiffKind::Create => created += 1,
                DiffKind::Update => updated += 1,
                DiffKind::Delete => deleted += 1,
            }
        }

        (created, updated, deleted)
    }
}

/// Keep one event per UID: the last one wins, at the position of the first.
fn dedup_by_uid(events: Vec<Event>) -> Vec<Event> {
    let mut index_by_uid: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Event> = Vec::with_capacity(events.len());

    for event in events {
        match index_by_uid.get(&event.uid) {
            Some(&i) => {
                tracing::warn!(uid = %event.uid, "Duplicate UID in feed, keeping the last one");
                unique[i] = event;
            }
            None => {
                index_by_uid.insert(event.uid.clone(), unique.len());
                unique.push(event);
            }
        }
    }

    unique
}
