/// Maximum number of occurrences generated for one recurring event.
pub const DEFAULT_MAX_OCCURRENCES: usize = 100;

/// How far past the base start time recurrences are expanded.
pub const DEFAULT_HORIZON_YEARS: u32 = 2;

/// Duration assumed for events without DTEND.
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 1;

/// Prefix for planning identifiers derived from a source locator.
pub const PLANNING_ID_PREFIX: &str = "ical-";

/// Palette planning colors are picked from.
pub const PLANNING_COLORS: [&str; 10] = [
    "#3B82F6", // Blue
    "#EF4444", // Red
    "#10B981", // Green
    "#F59E0B", // Yellow
    "#8B5CF6", // Purple
    "#F97316", // Orange
    "#06B6D4", // Cyan
    "#84CC16", // Lime
    "#EC4899", // Pink
    "#6B7280", // Gray
];
