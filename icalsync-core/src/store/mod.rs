//! Persistence collaborator for plannings and events.
//!
//! The reconciliation engine only talks to a `Store`. Events are addressed by
//! `(planning_id, uid)`, so the same UID in two plannings never collides.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::IcalSyncResult;
use crate::event::{Event, Planning};

pub trait Store {
    fn find_planning(&self, id: &str) -> IcalSyncResult<Option<Planning>>;

    /// Insert the planning, or overwrite every field except `created`.
    fn upsert_planning(&mut self, planning: &Planning) -> IcalSyncResult<()>;

    /// All events of a planning, ordered by start time then UID.
    fn events_for_planning(&self, planning_id: &str) -> IcalSyncResult<Vec<Event>>;

    fn find_event(&self, planning_id: &str, uid: &str) -> IcalSyncResult<Option<Event>>;

    /// Fails if an event with the same `(planning_id, uid)` exists.
    fn create_event(&mut self, event: &Event) -> IcalSyncResult<()>;

    /// Overwrite the mutable fields of an existing event, keeping its `created`.
    fn update_event(&mut self, event: &Event) -> IcalSyncResult<()>;

    fn delete_event(&mut self, planning_id: &str, uid: &str) -> IcalSyncResult<()>;

    fn count_events(&self) -> IcalSyncResult<u64>;

    fn count_plannings(&self) -> IcalSyncResult<u64>;
}
