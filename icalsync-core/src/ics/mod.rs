//! ICS feed parsing.
//!
//! This module turns raw RFC 5545 text into a `CalendarDocument` and builds
//! the human-readable planning description from calendar-level properties.

mod describe;
mod parse;

pub use describe::describe_calendar;
pub use parse::{Block, CalendarDocument, Component, Property, parse_calendar};
