//! reqwest-backed fetcher for the open data portal.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::info;

use crate::models::types::{Result, ScheduleError};
use crate::network::traits::ScheduleFetcher;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("parkwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScheduleError::Fetch(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ScheduleFetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            info!(url, "Downloading cleaning schedule");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ScheduleError::Fetch(format!("request to {url} failed: {e}")))?
                .error_for_status()
                .map_err(|e| ScheduleError::Fetch(format!("{url} answered with an error: {e}")))?;

            let body = response
                .bytes()
                .await
                .map_err(|e| ScheduleError::Fetch(format!("reading body from {url} failed: {e}")))?;

            info!(bytes = body.len(), "Schedule downloaded");
            Ok(body.to_vec())
        })
    }
}
