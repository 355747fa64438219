//! Reconciliation of one planning's desired events against the store.
//!
//! The engine owns its store and every pass takes `&mut self`, so two passes
//! over the same store cannot overlap. Failures of single writes are logged
//! and counted, never propagated: one bad row must not stop the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::{EventDiff, PlanningDiff};
use crate::error::IcalSyncResult;
use crate::event::{Event, Planning};
use crate::store::Store;

/// Per-run switches for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Delete persisted events missing from the feed
    pub sync_delete: bool,
    /// Classify only, never write
    pub dry_run: bool,
    /// Keep an existing planning's color on re-sync
    pub preserve_color: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            sync_delete: true,
            dry_run: false,
            preserve_color: true,
        }
    }
}

/// What happened (or would happen) to the planning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanningChange {
    Created,
    Updated,
}

/// Counters for one reconciliation pass, or a whole run when summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Writes that failed; not included in the counts above
    pub failed: usize,
    /// Feed events rejected before reconciliation (e.g. bad DTSTART)
    pub skipped: usize,
}

impl SyncStats {
    /// Counts a diff would produce if every write succeeded.
    pub fn planned(diff: &PlanningDiff) -> Self {
        let (created, updated, deleted) = diff.counts();
        SyncStats {
            created,
            updated,
            deleted,
            unchanged: diff.unchanged,
            ..Default::default()
        }
    }
}

impl std::ops::AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Outcome of reconciling one planning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub planning: Planning,
    pub planning_change: PlanningChange,
    pub diff: PlanningDiff,
    /// Applied counts, or planned counts on a dry run
    pub stats: SyncStats,
}

pub struct Reconciler<S: Store> {
    store: S,
    options: ReconcileOptions,
}

impl<S: Store> Reconciler<S> {
    pub fn new(store: S, options: ReconcileOptions) -> Self {
        Reconciler { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Upsert the planning, then bring its events in line with `desired`.
    pub fn reconcile(
        &mut self,
        planning: Planning,
        desired: Vec<Event>,
        now: DateTime<Utc>,
    ) -> IcalSyncResult<Reconciliation> {
        let (planning, planning_change) = self.upsert_planning(planning, now)?;
        let diff = self.plan(&planning.id, desired)?;

        let stats = if self.options.dry_run {
            SyncStats::planned(&diff)
        } else {
            self.apply(&diff, now)
        };

        Ok(Reconciliation {
            planning,
            planning_change,
            diff,
            stats,
        })
    }

    /// Create the planning or refresh it, keeping `created`, the default flag
    /// and (with `preserve_color`) the color of an existing record.
    pub fn upsert_planning(
        &mut self,
        desired: Planning,
        now: DateTime<Utc>,
    ) -> IcalSyncResult<(Planning, PlanningChange)> {
        let (planning, change) = match self.store.find_planning(&desired.id)? {
            Some(existing) => {
                let color = if self.options.preserve_color {
                    existing.color
                } else {
                    desired.color
                };
                let merged = Planning {
                    color,
                    is_default: existing.is_default,
                    created: existing.created,
                    updated: now,
                    ..desired
                };
                (merged, PlanningChange::Updated)
            }
            None => {
                let fresh = Planning {
                    is_default: false,
                    created: now,
                    updated: now,
                    ..desired
                };
                (fresh, PlanningChange::Created)
            }
        };

        if !self.options.dry_run {
            self.store.upsert_planning(&planning)?;
        }
        tracing::info!(planning = %planning, change = ?change, dry_run = self.options.dry_run, "Planning upserted");

        Ok((planning, change))
    }

    /// Classify `desired` against what the store holds for the planning.
    pub fn plan(&self, planning_id: &str, desired: Vec<Event>) -> IcalSyncResult<PlanningDiff> {
        let persisted = self.store.events_for_planning(planning_id)?;
        let diff = PlanningDiff::compute(planning_id, persisted, desired, self.options.sync_delete);

        for d in &diff.diffs {
            tracing::debug!(planning_id, "{d}");
        }

        Ok(diff)
    }

    /// Apply a diff, isolating per-event failures.
    pub fn apply(&mut self, diff: &PlanningDiff, now: DateTime<Utc>) -> SyncStats {
        let mut stats = SyncStats {
            unchanged: diff.unchanged,
            ..Default::default()
        };

        for d in &diff.diffs {
            let result = match d {
                EventDiff::Create { new } => self.store.create_event(new),
                EventDiff::Update { old, new } => {
                    let updated = Event {
                        created: old.created,
                        last_modified: now,
                        ..new.clone()
                    };
                    self.store.update_event(&updated)
                }
                EventDiff::Delete { old } => self.store.delete_event(&old.planning_id, &old.uid),
            };

            match (result, d) {
                (Ok(()), EventDiff::Create { .. }) => stats.created += 1,
                (Ok(()), EventDiff::Update { .. }) => stats.updated += 1,
                (Ok(()), EventDiff::Delete { .. }) => stats.deleted += 1,
                (Err(e), _) => {
                    tracing::warn!(planning_id = %diff.planning_id, uid = d.uid(), error = %e, "Failed to {}", action(d));
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

fn action(diff: &EventDiff) -> &'static str {
    match diff {
        EventDiff::Create { .. } => "create event",
        EventDiff::Update { .. } => "update event",
        EventDiff::Delete { .. } => "delete event",
    }
}
