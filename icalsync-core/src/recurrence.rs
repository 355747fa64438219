//! RRULE expansion for recurring events.
//!
//! A recurring base event becomes a bounded list of concrete occurrences.
//! Rule evaluation sits behind `RuleExpander` so it can be swapped out or
//! stubbed in tests; `RRuleExpander` is the default, built on the rrule crate.

use chrono::{DateTime, Duration, Months, NaiveDateTime, Utc};
use rrule::RRuleSet;

use crate::constants::{DEFAULT_HORIZON_YEARS, DEFAULT_MAX_OCCURRENCES};
use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::Event;
use crate::ics::Block;
use crate::normalize::local_to_utc;

/// Evaluates a recurrence rule into occurrence start times.
pub trait RuleExpander {
    /// Occurrences of `rule` anchored at `start`, in chronological order,
    /// all within `[start, until]`, at most `limit` of them.
    fn occurrences(
        &self,
        rule: &str,
        start: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> IcalSyncResult<Vec<DateTime<Utc>>>;
}

/// `RuleExpander` backed by the rrule crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleExpander;

impl RuleExpander for RRuleExpander {
    fn occurrences(
        &self,
        rule: &str,
        start: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> IcalSyncResult<Vec<DateTime<Utc>>> {
        let rrule_str = format!(
            "DTSTART:{}\nRRULE:{}",
            start.format("%Y%m%dT%H%M%SZ"),
            rule.trim()
        );

        let rrule_set: RRuleSet = rrule_str
            .parse()
            .map_err(|e| IcalSyncError::RecurrenceRule(format!("'{rule}': {e}")))?;

        // Widen by a second on each side so both bounds are inclusive
        let tz: rrule::Tz = Utc.into();
        let after = (start - Duration::seconds(1)).with_timezone(&tz);
        let before = (until + Duration::seconds(1)).with_timezone(&tz);

        let fetch_limit = u16::try_from(limit.saturating_add(1)).unwrap_or(u16::MAX);
        let result = rrule_set.after(after).before(before).all(fetch_limit);

        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| *dt >= start && *dt <= until)
            .take(limit)
            .collect())
    }
}

/// Rewrite UNTIL as a UTC date-time, which the rrule crate requires once
/// DTSTART is sent in UTC.
///
/// Date-only values become end of day UTC. Floating date-times are read in
/// `tzid`, the zone of the event's DTSTART, the same way DTSTART itself is.
fn normalize_until(rule: &str, tzid: Option<&str>) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
                    format!("{key}={value}T235959Z")
                } else if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
                    let utc = local_to_utc(local, tzid);
                    format!("{key}={}", utc.format("%Y%m%dT%H%M%SZ"))
                } else {
                    part.to_string()
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Bounds applied to every expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    pub max_occurrences: usize,
    pub horizon_years: u32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        ExpansionLimits {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl ExpansionLimits {
    /// Last instant occurrences may start at.
    pub fn horizon_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.horizon_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Expand a normalized base event using the RRULE of its originating block.
///
/// Always returns at least one event. Without a rule, or when the rule can't
/// be evaluated, the result is just the base event. Occurrence 0 keeps the
/// base UID and occurrence `i` becomes `<uid>-recurrence-<i>`.
pub fn expand_event(
    base: &Event,
    block: &Block,
    expander: &impl RuleExpander,
    limits: &ExpansionLimits,
) -> Vec<Event> {
    let Some(rule) = block.value("RRULE") else {
        return vec![base.clone()];
    };

    let tzid = block.prop("DTSTART").and_then(|p| p.param("TZID"));
    let rule = normalize_until(rule.trim(), tzid);

    let until = limits.horizon_end(base.start);
    let starts = match expander.occurrences(&rule, base.start, until, limits.max_occurrences) {
        Ok(starts) if !starts.is_empty() => starts,
        Ok(_) => {
            tracing::warn!(uid = %base.uid, rule = %rule, "RRULE yields no occurrences, keeping base event");
            return vec![base.clone()];
        }
        Err(e) => {
            tracing::warn!(uid = %base.uid, error = %e, "Failed to expand RRULE, keeping base event");
            return vec![base.clone()];
        }
    };

    let duration = base.duration();

    starts
        .into_iter()
        .enumerate()
        .map(|(i, start)| Event {
            uid: occurrence_uid(&base.uid, i),
            start,
            end: start + duration,
            ..base.clone()
        })
        .collect()
}

/// UID for the `index`-th occurrence of a recurring event.
pub fn occurrence_uid(base_uid: &str, index: usize) -> String {
    if index == 0 {
        base_uid.to_string()
    } else {
        format!("{base_uid}-recurrence-{index}")
    }
}
