//! End-to-end sync runs against an in-memory store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use icalsync_core::source::planning_id_for;
use icalsync_core::sync::{Importer, Overrides, SourceStatus, SyncOptions};
use icalsync_core::{FeedFetcher, IcalSyncError, IcalSyncResult, MemoryStore, Source, SourceSpec, Store};

/// Serves feeds from a map and counts every fetch.
#[derive(Default)]
struct ScriptedFetcher {
    feeds: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn with<B: AsRef<str>>(feeds: &[(&str, B)]) -> Self {
        let fetcher = ScriptedFetcher::default();
        for (locator, body) in feeds {
            fetcher.set(locator, body.as_ref());
        }
        fetcher
    }

    fn set(&self, locator: &str, body: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(locator.to_string(), body.to_string());
    }
}

impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &Source) -> IcalSyncResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .lock()
            .unwrap()
            .get(&source.to_string())
            .cloned()
            .ok_or_else(|| IcalSyncError::Fetch(format!("{source}: HTTP 503")))
    }
}

impl FeedFetcher for &ScriptedFetcher {
    async fn fetch(&self, source: &Source) -> IcalSyncResult<String> {
        (**self).fetch(source).await
    }
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap()
}

fn feed(events: &[(&str, &str, &str)]) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Test//EN\n");
    for (uid, start, end) in events {
        ics.push_str(&format!(
            "BEGIN:VEVENT\nUID:{uid}\nSUMMARY:Event {uid}\nDTSTART:{start}\nDTEND:{end}\nEND:VEVENT\n"
        ));
    }
    ics.push_str("END:VCALENDAR\n");
    ics
}

fn options(sync_delete: bool, dry_run: bool) -> SyncOptions {
    SyncOptions {
        sync_delete,
        dry_run,
        ..Default::default()
    }
}

#[tokio::test]
async fn single_event_is_created_then_updated_in_place() {
    let locator = "team.ics";
    let fetcher = ScriptedFetcher::with(&[(
        locator,
        &feed(&[("e1", "20250601T090000Z", "20250601T100000Z")]),
    )]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());
    let specs = [SourceSpec::new(locator)];
    let planning_id = planning_id_for(locator);

    let first = importer.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();
    assert_eq!(first.totals().created, 1);

    let created = importer.store().find_event(&planning_id, "e1").unwrap().unwrap();
    assert_eq!(created.duration(), Duration::hours(1));
    assert_eq!(importer.store().count_events().unwrap(), 1);

    fetcher.set(locator, &feed(&[("e1", "20250601T090000Z", "20250601T110000Z")]));
    let second = importer.run_at(&specs, &Overrides::default(), at(2, 8)).await.unwrap();
    assert_eq!(second.totals().updated, 1);
    assert_eq!(second.totals().created, 0);

    let updated = importer.store().find_event(&planning_id, "e1").unwrap().unwrap();
    assert_eq!(updated.duration(), Duration::hours(2));
    assert_eq!(updated.created, created.created);
    assert!(updated.last_modified > created.last_modified);
    assert_eq!(importer.store().count_events().unwrap(), 1);
}

#[tokio::test]
async fn resync_of_unchanged_feed_changes_nothing() {
    let body = "BEGIN:VCALENDAR
X-WR-CALNAME:Standups
BEGIN:VEVENT
UID:standup
SUMMARY:Standup
DTSTART:20250602T090000Z
DTEND:20250602T091500Z
RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR;COUNT=12
END:VEVENT
BEGIN:VEVENT
UID:offsite
DTSTART;VALUE=DATE:20250710
END:VEVENT
END:VCALENDAR";
    let fetcher = ScriptedFetcher::with(&[("standups.ics", body)]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());
    let specs = [SourceSpec::new("standups.ics")];

    let first = importer.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();
    assert_eq!(first.totals().created, 13);
    let snapshot = importer
        .store()
        .events_for_planning(&planning_id_for("standups.ics"))
        .unwrap();

    let second = importer.run_at(&specs, &Overrides::default(), at(3, 8)).await.unwrap();
    let totals = second.totals();
    assert_eq!((totals.created, totals.updated, totals.deleted), (0, 0, 0));
    assert_eq!(totals.unchanged, 13);

    let after = importer
        .store()
        .events_for_planning(&planning_id_for("standups.ics"))
        .unwrap();
    assert_eq!(after, snapshot);
}

#[tokio::test]
async fn deletion_follows_the_sync_delete_flag() {
    let locator = "team.ics";
    let both = feed(&[
        ("keep", "20250601T090000Z", "20250601T100000Z"),
        ("drop", "20250602T090000Z", "20250602T100000Z"),
    ]);
    let only_keep = feed(&[("keep", "20250601T090000Z", "20250601T100000Z")]);
    let specs = [SourceSpec::new(locator)];
    let planning_id = planning_id_for(locator);

    for (sync_delete, expect_present) in [(false, true), (true, false)] {
        let fetcher = ScriptedFetcher::with(&[(locator, &both)]);
        let mut importer = Importer::new(&fetcher, MemoryStore::new(), options(sync_delete, false));
        importer.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();

        fetcher.set(locator, &only_keep);
        let report = importer.run_at(&specs, &Overrides::default(), at(2, 8)).await.unwrap();

        let present = importer.store().find_event(&planning_id, "drop").unwrap().is_some();
        assert_eq!(present, expect_present, "sync_delete = {sync_delete}");
        assert_eq!(report.totals().deleted, usize::from(!expect_present));
    }
}

#[tokio::test]
async fn dry_run_plans_exactly_what_a_live_run_does() {
    let locator = "team.ics";
    let initial = feed(&[
        ("a", "20250601T090000Z", "20250601T100000Z"),
        ("b", "20250602T090000Z", "20250602T100000Z"),
        ("c", "20250603T090000Z", "20250603T100000Z"),
    ]);
    let next = feed(&[
        ("a", "20250601T090000Z", "20250601T100000Z"),
        ("b", "20250602T090000Z", "20250602T113000Z"),
        ("d", "20250604T090000Z", "20250604T100000Z"),
    ]);
    let specs = [SourceSpec::new(locator)];

    let seed_fetcher = ScriptedFetcher::with(&[(locator, &initial)]);
    let mut seeding = Importer::new(&seed_fetcher, MemoryStore::new(), SyncOptions::default());
    seeding.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();
    let seeded = seeding.into_store();

    let fetcher = ScriptedFetcher::with(&[(locator, &next)]);

    let mut dry = Importer::new(&fetcher, seeded.clone(), options(true, true));
    let planned = dry.run_at(&specs, &Overrides::default(), at(2, 8)).await.unwrap();

    let mut live = Importer::new(&fetcher, seeded.clone(), options(true, false));
    let applied = live.run_at(&specs, &Overrides::default(), at(2, 8)).await.unwrap();

    let plan = planned.sources[0].planned.as_ref().unwrap();
    assert_eq!(plan.create, vec!["d"]);
    assert_eq!(plan.update, vec!["b"]);
    assert_eq!(plan.delete, vec!["c"]);
    assert_eq!(planned.totals(), applied.totals());

    let planning_id = planning_id_for(locator);
    let untouched = dry.into_store();
    assert_eq!(
        untouched.events_for_planning(&planning_id).unwrap(),
        seeded.events_for_planning(&planning_id).unwrap()
    );

    let live_store = live.into_store();
    assert!(live_store.find_event(&planning_id, "d").unwrap().is_some());
    assert!(live_store.find_event(&planning_id, "c").unwrap().is_none());

    // The live run left nothing more for a second plan to do
    let mut replan = Importer::new(&fetcher, live_store, options(true, true));
    let report = replan.run_at(&specs, &Overrides::default(), at(3, 8)).await.unwrap();
    let leftover = report.sources[0].planned.as_ref().unwrap();
    assert!(leftover.create.is_empty() && leftover.update.is_empty() && leftover.delete.is_empty());
}

#[tokio::test]
async fn custom_name_with_two_sources_fails_before_fetching() {
    let fetcher = ScriptedFetcher::with(&[("a.ics", &feed(&[])), ("b.ics", &feed(&[]))]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());
    let overrides = Overrides {
        name: Some("Team".to_string()),
        planning_id: None,
    };

    let err = importer
        .run_at(&[SourceSpec::new("a.ics"), SourceSpec::new("b.ics")], &overrides, at(1, 8))
        .await
        .unwrap_err();

    assert!(matches!(err, IcalSyncError::Configuration(_)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(importer.store().count_plannings().unwrap(), 0);
}

#[tokio::test]
async fn failing_source_does_not_stop_the_others() {
    let fetcher = ScriptedFetcher::with(&[
        ("first.ics", &feed(&[("f1", "20250601T090000Z", "20250601T100000Z")])),
        (
            "third.ics",
            &feed(&[
                ("t1", "20250601T090000Z", "20250601T100000Z"),
                ("t2", "20250602T090000Z", "20250602T100000Z"),
            ]),
        ),
    ]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());
    let specs = [
        SourceSpec::new("first.ics"),
        SourceSpec::new("https://calendar.example.com/second.ics"),
        SourceSpec::new("third.ics"),
    ];

    let report = importer.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(&report.sources[1].status, SourceStatus::Failed(msg) if msg.contains("503")));
    assert_eq!(report.sources[1].name, "Calendar from calendar.example.com");
    assert_eq!(report.totals().created, 3);
    assert_eq!(importer.store().count_plannings().unwrap(), 2);
    assert_eq!(importer.store().count_events().unwrap(), 3);
}

#[tokio::test]
async fn same_uid_in_two_plannings_does_not_collide() {
    let shared = feed(&[("shared", "20250601T090000Z", "20250601T100000Z")]);
    let fetcher = ScriptedFetcher::with(&[("home.ics", &shared), ("work.ics", &shared)]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());
    let specs = [SourceSpec::new("home.ics"), SourceSpec::new("work.ics")];

    importer.run_at(&specs, &Overrides::default(), at(1, 8)).await.unwrap();
    // Dropping the event from one feed only removes it from that planning
    fetcher.set("work.ics", &feed(&[]));
    importer.run_at(&specs, &Overrides::default(), at(2, 8)).await.unwrap();

    let store = importer.store();
    assert!(store.find_event(&planning_id_for("home.ics"), "shared").unwrap().is_some());
    assert!(store.find_event(&planning_id_for("work.ics"), "shared").unwrap().is_none());
}

#[tokio::test]
async fn unbounded_recurrence_is_capped_and_bounded() {
    let body = "BEGIN:VCALENDAR
BEGIN:VEVENT
UID:daily
DTSTART:20250601T090000Z
DTEND:20250601T093000Z
RRULE:FREQ=DAILY
END:VEVENT
END:VCALENDAR";
    let fetcher = ScriptedFetcher::with(&[("daily.ics", body)]);
    let mut importer = Importer::new(&fetcher, MemoryStore::new(), SyncOptions::default());

    importer
        .run_at(&[SourceSpec::new("daily.ics")], &Overrides::default(), at(1, 8))
        .await
        .unwrap();

    let events = importer
        .store()
        .events_for_planning(&planning_id_for("daily.ics"))
        .unwrap();
    let base_start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    assert_eq!(events.len(), 100);
    assert!(events.iter().all(|e| e.duration() == Duration::minutes(30)));
    assert!(events.iter().all(|e| e.start >= base_start && e.start <= base_start + Duration::days(731)));
    assert_eq!(events[0].uid, "daily");
    assert_eq!(events[99].uid, "daily-recurrence-99");
}
