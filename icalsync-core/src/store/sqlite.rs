//! SQLite-backed `Store`.
//!
//! Timestamps are stored as UTC text through rusqlite's chrono support, which
//! keeps them sortable as plain strings.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::{Event, Planning};
use crate::store::Store;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the tables exist.
    pub fn open(path: &Path) -> IcalSyncResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an existing, initialized database without writing to it.
    ///
    /// Nothing is created: a missing file or missing tables is an error.
    pub fn open_read_only(path: &Path) -> IcalSyncResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('plannings', 'events')",
            [],
            |row| row.get(0),
        )?;
        if tables < 2 {
            return Err(IcalSyncError::Persistence(format!(
                "{} has no icalsync tables",
                path.display()
            )));
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> IcalSyncResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Create the `plannings` and `events` tables if they don't exist.
    pub fn init(&self) -> IcalSyncResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS plannings (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                color       TEXT NOT NULL DEFAULT '#3B82F6',
                is_default  INTEGER NOT NULL DEFAULT 0,
                created     TEXT NOT NULL,
                updated     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                planning_id   TEXT NOT NULL REFERENCES plannings(id),
                uid           TEXT NOT NULL,
                summary       TEXT NOT NULL DEFAULT '',
                description   TEXT NOT NULL DEFAULT '',
                location      TEXT NOT NULL DEFAULT '',
                start_time    TEXT NOT NULL,
                end_time      TEXT NOT NULL,
                created       TEXT NOT NULL,
                last_modified TEXT NOT NULL,
                PRIMARY KEY (planning_id, uid)
            );

            CREATE INDEX IF NOT EXISTS idx_events_planning_id ON events(planning_id);
            CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time);",
        )?;
        Ok(())
    }
}

const EVENT_COLUMNS: &str =
    "uid, planning_id, summary, description, location, start_time, end_time, created, last_modified";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        uid: row.get(0)?,
        planning_id: row.get(1)?,
        summary: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start: row.get(5)?,
        end: row.get(6)?,
        created: row.get(7)?,
        last_modified: row.get(8)?,
    })
}

fn planning_from_row(row: &Row<'_>) -> rusqlite::Result<Planning> {
    Ok(Planning {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        is_default: row.get(4)?,
        created: row.get(5)?,
        updated: row.get(6)?,
    })
}

impl Store for SqliteStore {
    fn find_planning(&self, id: &str) -> IcalSyncResult<Option<Planning>> {
        let planning = self
            .conn
            .query_row(
                "SELECT id, name, description, color, is_default, created, updated
                 FROM plannings WHERE id = ?1",
                params![id],
                planning_from_row,
            )
            .optional()?;
        Ok(planning)
    }

    fn upsert_planning(&mut self, planning: &Planning) -> IcalSyncResult<()> {
        self.conn.execute(
            "INSERT INTO plannings (id, name, description, color, is_default, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                color = excluded.color,
                is_default = excluded.is_default,
                updated = excluded.updated",
            params![
                planning.id,
                planning.name,
                planning.description,
                planning.color,
                planning.is_default,
                planning.created,
                planning.updated,
            ],
        )?;
        Ok(())
    }

    fn events_for_planning(&self, planning_id: &str) -> IcalSyncResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE planning_id = ?1 ORDER BY start_time, uid"
        ))?;
        let events = stmt
            .query_map(params![planning_id], event_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    fn find_event(&self, planning_id: &str, uid: &str) -> IcalSyncResult<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE planning_id = ?1 AND uid = ?2"),
                params![planning_id, uid],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    fn create_event(&mut self, event: &Event) -> IcalSyncResult<()> {
        self.conn.execute(
            &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                event.uid,
                event.planning_id,
                event.summary,
                event.description,
                event.location,
                event.start,
                event.end,
                event.created,
                event.last_modified,
            ],
        )?;
        Ok(())
    }

    fn update_event(&mut self, event: &Event) -> IcalSyncResult<()> {
        let changed = self.conn.execute(
            "UPDATE events SET
                summary = ?3,
                description = ?4,
                location = ?5,
                start_time = ?6,
                end_time = ?7,
                last_modified = ?8
             WHERE planning_id = ?1 AND uid = ?2",
            params![
                event.planning_id,
                event.uid,
                event.summary,
                event.description,
                event.location,
                event.start,
                event.end,
                event.last_modified,
            ],
        )?;

        if changed == 0 {
            return Err(IcalSyncError::Persistence(format!(
                "Event '{}' not found in planning '{}'",
                event.uid, event.planning_id
            )));
        }
        Ok(())
    }

    fn delete_event(&mut self, planning_id: &str, uid: &str) -> IcalSyncResult<()> {
        self.conn.execute(
            "DELETE FROM events WHERE planning_id = ?1 AND uid = ?2",
            params![planning_id, uid],
        )?;
        Ok(())
    }

    fn count_events(&self) -> IcalSyncResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_plannings(&self) -> IcalSyncResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM plannings", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn planning(id: &str) -> Planning {
        Planning {
            id: id.to_string(),
            name: "Team".to_string(),
            description: "Calendar: Team".to_string(),
            color: "#10B981".to_string(),
            is_default: false,
            created: at(1),
            updated: at(1),
        }
    }

    fn event(uid: &str, hour: u32) -> Event {
        Event {
            uid: uid.to_string(),
            planning_id: "p".to_string(),
            summary: format!("Event {uid}"),
            description: String::new(),
            location: "Room 4".to_string(),
            start: at(hour),
            end: at(hour) + Duration::minutes(45),
            created: at(0),
            last_modified: at(0),
        }
    }

    #[test]
    fn test_planning_upsert_preserves_created() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_planning(&planning("p")).unwrap();

        let mut renamed = planning("p");
        renamed.name = "Renamed".to_string();
        renamed.created = at(9);
        renamed.updated = at(9);
        store.upsert_planning(&renamed).unwrap();

        let stored = store.find_planning("p").unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.created, at(1));
        assert_eq!(stored.updated, at(9));
        assert_eq!(store.count_plannings().unwrap(), 1);
    }

    #[test]
    fn test_event_crud_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_planning(&planning("p")).unwrap();
        store.create_event(&event("late", 15)).unwrap();
        store.create_event(&event("early", 8)).unwrap();

        let events = store.events_for_planning("p").unwrap();
        let uids: Vec<_> = events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["early", "late"]);
        assert_eq!(events[0], event("early", 8));

        let mut moved = event("early", 10);
        moved.created = at(12);
        moved.last_modified = at(12);
        store.update_event(&moved).unwrap();

        let stored = store.find_event("p", "early").unwrap().unwrap();
        assert_eq!(stored.start, at(10));
        assert_eq!(stored.created, at(0));
        assert_eq!(stored.last_modified, at(12));

        store.delete_event("p", "late").unwrap();
        assert!(store.find_event("p", "late").unwrap().is_none());
        assert_eq!(store.count_events().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_create_is_persistence_error() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.create_event(&event("e1", 9)).unwrap();

        assert!(matches!(
            store.create_event(&event("e1", 9)),
            Err(IcalSyncError::Persistence(_))
        ));
        assert!(matches!(
            store.update_event(&event("ghost", 9)),
            Err(IcalSyncError::Persistence(_))
        ));
    }

    #[test]
    fn test_open_file_creates_schema_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("icalsync.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert_planning(&planning("p")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count_plannings().unwrap(), 1);
    }

    #[test]
    fn test_read_only_open_never_creates_anything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("icalsync.db");

        assert!(SqliteStore::open_read_only(&path).is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_read_only_open_reads_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icalsync.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert_planning(&planning("p")).unwrap();
        }

        let store = SqliteStore::open_read_only(&path).unwrap();

        assert_eq!(store.count_plannings().unwrap(), 1);
        assert!(store.find_planning("p").unwrap().is_some());
    }

    #[test]
    fn test_read_only_open_rejects_uninitialized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE notes (body TEXT);")
            .unwrap();

        assert!(matches!(
            SqliteStore::open_read_only(&path),
            Err(IcalSyncError::Persistence(_))
        ));
    }
}
