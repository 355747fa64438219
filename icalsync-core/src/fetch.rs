//! Retrieval of raw feed content from URLs and local files.

use std::future::Future;
use std::time::Duration;

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::source::Source;

const USER_AGENT: &str = concat!("icalsync/", env!("CARGO_PKG_VERSION"));

/// Produces the raw text of a calendar feed.
pub trait FeedFetcher {
    fn fetch(&self, source: &Source) -> impl Future<Output = IcalSyncResult<String>> + Send;
}

/// Fetches URLs over HTTP(S) and reads local paths from disk.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(timeout: Duration) -> IcalSyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| IcalSyncError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(SourceFetcher { http })
    }

    async fn fetch_url(&self, url: &url::Url) -> IcalSyncResult<String> {
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| IcalSyncError::Fetch(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IcalSyncError::Fetch(format!("{url}: HTTP {status}")));
        }

        resp.text()
            .await
            .map_err(|e| IcalSyncError::Fetch(format!("{url}: failed to read body: {e}")))
    }
}

impl FeedFetcher for SourceFetcher {
    async fn fetch(&self, source: &Source) -> IcalSyncResult<String> {
        tracing::debug!(%source, "Fetching feed");

        match source {
            Source::Url(url) => self.fetch_url(url).await,
            Source::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| IcalSyncError::Read(format!("{}: {e}", path.display())))?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}
