//! # parkwatch-core
//!
//! Parking state, favorites, settings and the reminder engine on top of
//! [`parkwatch_schedule`].

pub mod error;
pub mod monitor;
pub mod reminder;
pub mod settings;
pub mod state;

pub use error::{CoreError, Result};
pub use monitor::{Monitor, ParkingReport};
pub use reminder::{
    evaluate, MaintenanceAction, Notification, NotificationTarget, ReminderInputs, SchedulerState,
    Severity, TickOutcome,
};
pub use settings::Settings;
pub use state::{Favorites, ParkedVehicle, ParkingState, StateStore};

// Re-export the schedule crate
pub use parkwatch_schedule as schedule;
