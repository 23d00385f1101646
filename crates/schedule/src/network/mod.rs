//! Network and IO abstractions.

pub mod http;
pub mod storage;
pub mod traits;

pub use http::HttpFetcher;
pub use storage::{read_if_exists, write_atomic};
pub use traits::ScheduleFetcher;
