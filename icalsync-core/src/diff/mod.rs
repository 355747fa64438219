//! Classification of desired vs persisted events.

mod diff_kind;
mod event_diff;
mod planning_diff;

pub use diff_kind::DiffKind;
pub use event_diff::EventDiff;
pub use planning_diff::PlanningDiff;
