//! Mapping of VEVENT blocks onto canonical `Event` records.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::DEFAULT_EVENT_DURATION_HOURS;
use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::Event;
use crate::ics::{Block, Property};

/// Normalize one event block into an `Event` owned by `planning_id`.
///
/// A block without a UID gets a fresh random one, so re-importing a feed that
/// lacks UIDs creates new events every time.
pub fn normalize_event(block: &Block, planning_id: &str, now: DateTime<Utc>) -> IcalSyncResult<Event> {
    let uid = block
        .value("UID")
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let start = match block.prop("DTSTART") {
        Some(prop) => parse_date_time(prop)?,
        None => {
            return Err(IcalSyncError::DateParse(format!(
                "Event '{uid}' has no DTSTART"
            )));
        }
    };

    let end = match block.prop("DTEND") {
        Some(prop) => parse_date_time(prop)?,
        None => start + Duration::hours(DEFAULT_EVENT_DURATION_HOURS),
    };

    // Best effort: unparseable bookkeeping timestamps keep the default
    let created = block
        .prop("CREATED")
        .and_then(|p| parse_date_time(p).ok())
        .unwrap_or(now);
    let last_modified = block
        .prop("LAST-MODIFIED")
        .and_then(|p| parse_date_time(p).ok())
        .unwrap_or(now);

    let text = |name: &str| block.value(name).unwrap_or_default().to_string();

    Ok(Event {
        uid,
        planning_id: planning_id.to_string(),
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        start,
        end,
        created,
        last_modified,
    })
}

/// Parse a date-time property value.
///
/// Encodings are tried in order: UTC (`20250601T090000Z`), local
/// (`20250601T090000`) and date-only (`20250601`). Local values are read in
/// the zone named by a `TZID` parameter when it is a known IANA zone, and as
/// UTC otherwise. Date-only values are midnight UTC.
pub fn parse_date_time(prop: &Property) -> IcalSyncResult<DateTime<Utc>> {
    let value = prop.value.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Ok(dt.and_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(local_to_utc(dt, prop.param("TZID")));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err(IcalSyncError::DateParse(format!(
        "Unable to parse {} value '{}'",
        prop.name, value
    )))
}

pub(crate) fn local_to_utc(dt: NaiveDateTime, tzid: Option<&str>) -> DateTime<Utc> {
    let Some(tz) = tzid.and_then(|id| id.trim_matches('"').parse::<Tz>().ok()) else {
        return dt.and_utc();
    };

    // Nonexistent local times (DST gap) fall back to reading the wall clock as UTC
    tz.from_local_datetime(&dt)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| dt.and_utc())
}
