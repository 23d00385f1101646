//! Reminder engine and its persisted bookkeeping.

pub mod engine;
pub mod types;

pub use engine::{evaluate, ReminderInputs};
pub use types::{
    MaintenanceAction, Notification, NotificationMarker, NotificationTarget, RefreshStatus,
    SchedulerState, Severity, TickOutcome,
};
