//! Planning description built from calendar-level properties.

use crate::ics::CalendarDocument;
use crate::source::Source;

/// Build a newline-separated summary of where a calendar comes from.
pub fn describe_calendar(doc: &CalendarDocument, source: &Source) -> String {
    let mut parts = Vec::new();

    if let Some(name) = doc.property("X-WR-CALNAME") {
        parts.push(format!("Calendar: {name}"));
    }
    if let Some(desc) = doc.property("X-WR-CALDESC") {
        parts.push(format!("Description: {desc}"));
    }
    if let Some(tz) = doc.property("X-WR-TIMEZONE") {
        parts.push(format!("Timezone: {tz}"));
    }
    if let Some(prodid) = doc.property("PRODID") {
        parts.push(format!("Created by: {}", pretty_prodid(prodid)));
    }
    if let Some(version) = doc.property("VERSION") {
        parts.push(format!("iCal Version: {version}"));
    }

    let event_count = doc.events().count();
    if event_count > 0 {
        parts.push(format!("Contains {event_count} events"));
    }

    parts.push(source.origin_label());
    parts.join("\n")
}

fn pretty_prodid(prodid: &str) -> &str {
    if prodid.contains("Google") {
        "Google Calendar"
    } else if prodid.contains("Microsoft") || prodid.contains("Outlook") {
        "Microsoft Outlook"
    } else if prodid.contains("Apple") {
        "Apple Calendar"
    } else {
        prodid
    }
}
