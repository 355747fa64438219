//! Run report produced by the sync orchestrator.

use serde::Serialize;

use crate::diff::{DiffKind, PlanningDiff};
use crate::reconcile::{PlanningChange, SyncStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceStatus {
    Ok,
    Failed(String),
    /// Listed in the configuration but `enabled = false`
    Disabled,
}

/// UIDs a dry run would create, update or delete in one planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlannedChanges {
    pub create: Vec<String>,
    pub update: Vec<String>,
    pub delete: Vec<String>,
}

impl From<&PlanningDiff> for PlannedChanges {
    fn from(diff: &PlanningDiff) -> Self {
        PlannedChanges {
            create: diff.uids(DiffKind::Create),
            update: diff.uids(DiffKind::Update),
            delete: diff.uids(DiffKind::Delete),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub locator: String,
    pub planning_id: String,
    pub status: SourceStatus,
    pub planning_change: Option<PlanningChange>,
    pub stats: SyncStats,
    /// Only set on dry runs
    pub planned: Option<PlannedChanges>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.status == SourceStatus::Ok
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Sources that were enabled and went through the pipeline.
    pub fn attempted(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status != SourceStatus::Disabled)
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failed()).count()
    }

    /// Event counts summed over every source.
    pub fn totals(&self) -> SyncStats {
        let mut totals = SyncStats::default();
        for source in &self.sources {
            totals += source.stats;
        }
        totals
    }
}
