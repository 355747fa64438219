//! In-memory `Store`, used by tests and dry experiments.

use std::collections::BTreeMap;

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::{Event, Planning};
use crate::store::Store;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    plannings: BTreeMap<String, Planning>,
    events: BTreeMap<(String, String), Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(planning_id: &str, uid: &str) -> (String, String) {
    (planning_id.to_string(), uid.to_string())
}

impl Store for MemoryStore {
    fn find_planning(&self, id: &str) -> IcalSyncResult<Option<Planning>> {
        Ok(self.plannings.get(id).cloned())
    }

    fn upsert_planning(&mut self, planning: &Planning) -> IcalSyncResult<()> {
        let mut planning = planning.clone();
        if let Some(existing) = self.plannings.get(&planning.id) {
            planning.created = existing.created;
        }
        self.plannings.insert(planning.id.clone(), planning);
        Ok(())
    }

    fn events_for_planning(&self, planning_id: &str) -> IcalSyncResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .values()
            .filter(|e| e.planning_id == planning_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.uid.cmp(&b.uid)));
        Ok(events)
    }

    fn find_event(&self, planning_id: &str, uid: &str) -> IcalSyncResult<Option<Event>> {
        Ok(self.events.get(&key(planning_id, uid)).cloned())
    }

    fn create_event(&mut self, event: &Event) -> IcalSyncResult<()> {
        let k = key(&event.planning_id, &event.uid);
        if self.events.contains_key(&k) {
            return Err(IcalSyncError::Persistence(format!(
                "Event '{}' already exists in planning '{}'",
                event.uid, event.planning_id
            )));
        }
        self.events.insert(k, event.clone());
        Ok(())
    }

    fn update_event(&mut self, event: &Event) -> IcalSyncResult<()> {
        let existing = self
            .events
            .get_mut(&key(&event.planning_id, &event.uid))
            .ok_or_else(|| {
                IcalSyncError::Persistence(format!(
                    "Event '{}' not found in planning '{}'",
                    event.uid, event.planning_id
                ))
            })?;

        let created = existing.created;
        *existing = Event {
            created,
            ..event.clone()
        };
        Ok(())
    }

    fn delete_event(&mut self, planning_id: &str, uid: &str) -> IcalSyncResult<()> {
        self.events.remove(&key(planning_id, uid));
        Ok(())
    }

    fn count_events(&self) -> IcalSyncResult<u64> {
        Ok(self.events.len() as u64)
    }

    fn count_plannings(&self) -> IcalSyncResult<u64> {
        Ok(self.plannings.len() as u64)
    }
}
