//! Persisted user state.

pub mod favorites;
pub mod parking;
pub mod snapshot;
pub mod store;

pub use favorites::{FavoriteStreet, Favorites};
pub use parking::{ParkedVehicle, ParkingState, HISTORY_LIMIT};
pub use store::StateStore;
