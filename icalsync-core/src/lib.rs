//! Calendar feed ingestion and reconciliation for icalsync.
//!
//! The pipeline runs left to right for every source:
//! - `fetch` reads the raw feed from a URL or local file
//! - `ics` parses it into calendar properties and component blocks
//! - `normalize` maps event blocks onto `Event` records
//! - `recurrence` expands recurring events into bounded occurrences
//! - `reconcile` diffs the result against a `Store` and applies it
//!
//! `sync` drives the pipeline over many sources and builds the run report.

pub mod constants;
pub mod diff;
pub mod error;
pub mod event;
pub mod fetch;
pub mod ics;
pub mod normalize;
pub mod reconcile;
pub mod recurrence;
pub mod source;
pub mod store;
pub mod sync;
pub mod sync_config;

pub use error::{IcalSyncError, IcalSyncResult};
pub use event::{Event, Planning};
pub use fetch::{FeedFetcher, SourceFetcher};
pub use reconcile::{ReconcileOptions, Reconciler, SyncStats};
pub use recurrence::{ExpansionLimits, RRuleExpander, RuleExpander};
pub use source::{Source, SourceSpec};
pub use store::{MemoryStore, SqliteStore, Store};
pub use sync::{Importer, Overrides, RunReport, SourceReport, SourceStatus, SyncOptions};
pub use sync_config::SyncConfig;
