//! Sync orchestrator: runs the import pipeline over a set of sources.
//!
//! Feeds are fetched concurrently (bounded by `fetch_concurrency`), then each
//! source is parsed, normalized, expanded and reconciled one after the other.
//! A failing source is recorded in the report and the run moves on.

mod report;

pub use report::{PlannedChanges, RunReport, SourceReport, SourceStatus};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::{Event, Planning};
use crate::fetch::FeedFetcher;
use crate::ics::{describe_calendar, parse_calendar};
use crate::normalize::normalize_event;
use crate::reconcile::{ReconcileOptions, Reconciler, Reconciliation, SyncStats};
use crate::recurrence::{ExpansionLimits, RRuleExpander, RuleExpander, expand_event};
use crate::source::{Source, SourceSpec, color_for};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub sync_delete: bool,
    pub dry_run: bool,
    pub preserve_color: bool,
    pub limits: ExpansionLimits,
    /// Maximum number of feeds fetched at once
    pub fetch_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            sync_delete: true,
            dry_run: false,
            preserve_color: true,
            limits: ExpansionLimits::default(),
            fetch_concurrency: 4,
        }
    }
}

impl SyncOptions {
    fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            sync_delete: self.sync_delete,
            dry_run: self.dry_run,
            preserve_color: self.preserve_color,
        }
    }
}

/// Invocation-wide name and identifier overrides (`--name`, `--id`).
///
/// Only valid when a single source is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub name: Option<String>,
    pub planning_id: Option<String>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.planning_id.is_none()
    }

    fn apply(&self, spec: &SourceSpec) -> SourceSpec {
        let mut spec = spec.clone();
        if let Some(name) = &self.name {
            spec.name = Some(name.clone());
        }
        if let Some(id) = &self.planning_id {
            spec.custom_id = Some(id.clone());
        }
        spec
    }
}

pub struct Importer<F, S: Store, X = RRuleExpander> {
    fetcher: F,
    reconciler: Reconciler<S>,
    expander: X,
    options: SyncOptions,
}

impl<F: FeedFetcher, S: Store> Importer<F, S> {
    pub fn new(fetcher: F, store: S, options: SyncOptions) -> Self {
        Importer {
            fetcher,
            reconciler: Reconciler::new(store, options.reconcile_options()),
            expander: RRuleExpander,
            options,
        }
    }
}

impl<F: FeedFetcher, S: Store, X: RuleExpander> Importer<F, S, X> {
    /// Swap the recurrence rule evaluator.
    pub fn with_expander<Y: RuleExpander>(self, expander: Y) -> Importer<F, S, Y> {
        Importer {
            fetcher: self.fetcher,
            reconciler: self.reconciler,
            expander,
            options: self.options,
        }
    }

    pub fn store(&self) -> &S {
        self.reconciler.store()
    }

    pub fn into_store(self) -> S {
        self.reconciler.into_store()
    }

    pub async fn run(&mut self, specs: &[SourceSpec], overrides: &Overrides) -> IcalSyncResult<RunReport> {
        self.run_at(specs, overrides, Utc::now()).await
    }

    /// Run the pipeline with an explicit clock.
    ///
    /// Only configuration errors are returned; everything else ends up in the
    /// per-source entries of the report.
    pub async fn run_at(
        &mut self,
        specs: &[SourceSpec],
        overrides: &Overrides,
        now: DateTime<Utc>,
    ) -> IcalSyncResult<RunReport> {
        let enabled = resolve_specs(specs, overrides)?;

        let fetcher = &self.fetcher;
        let fetched: Vec<IcalSyncResult<(Source, String)>> = stream::iter(&enabled)
            .map(|spec| async move {
                let source = Source::parse(&spec.locator)?;
                let body = fetcher.fetch(&source).await?;
                Ok::<_, IcalSyncError>((source, body))
            })
            .buffered(self.options.fetch_concurrency.max(1))
            .collect()
            .await;

        let mut report = RunReport {
            dry_run: self.options.dry_run,
            sources: Vec::with_capacity(specs.len()),
        };

        let mut fetched = enabled.iter().zip(fetched);

        // Report entries follow input order, disabled sources included
        for input in specs {
            if !input.enabled {
                report.sources.push(SourceReport {
                    name: display_name(input),
                    locator: input.locator.clone(),
                    planning_id: input.planning_id(),
                    status: SourceStatus::Disabled,
                    planning_change: None,
                    stats: SyncStats::default(),
                    planned: None,
                });
                continue;
            }
            let Some((spec, outcome)) = fetched.next() else {
                break;
            };

            tracing::info!(source = %spec.locator, "Syncing");

            let result = outcome.and_then(|(source, body)| self.sync_source(spec, &source, &body, now));

            let source_report = match result {
                Ok((name, reconciliation)) => {
                    let stats = reconciliation.stats;
                    tracing::info!(
                        planning = %reconciliation.planning.id,
                        created = stats.created,
                        updated = stats.updated,
                        deleted = stats.deleted,
                        unchanged = stats.unchanged,
                        failed = stats.failed,
                        skipped = stats.skipped,
                        "Synced {name}"
                    );
                    SourceReport {
                        name,
                        locator: spec.locator.clone(),
                        planning_id: reconciliation.planning.id.clone(),
                        status: SourceStatus::Ok,
                        planning_change: Some(reconciliation.planning_change),
                        stats,
                        planned: self
                            .options
                            .dry_run
                            .then(|| PlannedChanges::from(&reconciliation.diff)),
                    }
                }
                Err(e) => {
                    tracing::error!(source = %spec.locator, error = %e, "Failed to sync source");
                    SourceReport {
                        name: display_name(spec),
                        locator: spec.locator.clone(),
                        planning_id: spec.planning_id(),
                        status: SourceStatus::Failed(e.to_string()),
                        planning_change: None,
                        stats: SyncStats::default(),
                        planned: None,
                    }
                }
            };
            report.sources.push(source_report);
        }

        Ok(report)
    }

    /// Parse → normalize → expand → reconcile for one fetched feed.
    fn sync_source(
        &mut self,
        spec: &SourceSpec,
        source: &Source,
        body: &str,
        now: DateTime<Utc>,
    ) -> IcalSyncResult<(String, Reconciliation)> {
        let doc = parse_calendar(body)?;
        let planning_id = spec.planning_id();

        let name = spec
            .custom_name()
            .or_else(|| doc.property("X-WR-CALNAME"))
            .map(str::to_string)
            .unwrap_or_else(|| source.fallback_name());

        let planning = Planning {
            color: color_for(&planning_id),
            description: describe_calendar(&doc, source),
            name: name.clone(),
            id: planning_id.clone(),
            is_default: false,
            created: now,
            updated: now,
        };

        let mut desired: Vec<Event> = Vec::new();
        let mut skipped = 0;
        for block in doc.events() {
            match normalize_event(block, &planning_id, now) {
                Ok(base) => desired.extend(expand_event(&base, block, &self.expander, &self.options.limits)),
                Err(e) => {
                    tracing::warn!(planning = %planning_id, error = %e, "Skipping event");
                    skipped += 1;
                }
            }
        }

        let mut reconciliation = self.reconciler.reconcile(planning, desired, now)?;
        reconciliation.stats.skipped = skipped;

        Ok((name, reconciliation))
    }
}

/// Check a source list and its overrides without touching the network or disk.
pub fn validate_sources(specs: &[SourceSpec], overrides: &Overrides) -> IcalSyncResult<()> {
    resolve_specs(specs, overrides).map(|_| ())
}

/// Enabled sources with overrides applied, validated before any I/O.
fn resolve_specs(specs: &[SourceSpec], overrides: &Overrides) -> IcalSyncResult<Vec<SourceSpec>> {
    let enabled: Vec<&SourceSpec> = specs.iter().filter(|s| s.enabled).collect();

    if !overrides.is_empty() && enabled.len() > 1 {
        return Err(IcalSyncError::Configuration(format!(
            "A custom name or id can only be used with a single source, got {}",
            enabled.len()
        )));
    }

    let resolved: Vec<SourceSpec> = enabled.into_iter().map(|spec| overrides.apply(spec)).collect();

    let mut seen = HashSet::new();
    for spec in &resolved {
        let id = spec.planning_id();
        if !seen.insert(id.clone()) {
            return Err(IcalSyncError::Configuration(format!(
                "Two sources map to planning '{id}' ({})",
                spec.locator
            )));
        }
    }

    Ok(resolved)
}

fn display_name(spec: &SourceSpec) -> String {
    if let Some(name) = spec.custom_name() {
        return name.to_string();
    }
    match Source::parse(&spec.locator) {
        Ok(source) => source.fallback_name(),
        Err(_) => spec.locator.clone(),
    }
}
