//! Pluggable networking traits.
//!
//! The store only needs raw bytes from somewhere; tests and alternative
//! transports implement these.

use std::future::Future;
use std::pin::Pin;

use crate::models::types::Result;

/// Fetch the raw schedule document from a URL
pub trait ScheduleFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}
