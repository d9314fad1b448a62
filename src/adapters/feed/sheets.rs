use crate::adapters::feed::{FeedFetcher, FeedStream, FetchError};
use crate::config::FeedConfig;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

const ACCEPT_CSV: &str = "text/csv,application/json;q=0.9";
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches the public CSV export of a Google Sheets document.
#[derive(Clone, Debug)]
pub struct SheetsFeedFetcher {
    client: reqwest::Client,
    export_base_url: String,
}

impl SheetsFeedFetcher {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &FeedConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_CSV));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.fetch_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;

        Ok(Self { client, export_base_url: config.export_base_url.trim_end_matches('/').to_string() })
    }

    #[must_use]
    pub fn export_url(&self, document_id: &str) -> String {
        format!("{}/spreadsheets/d/{document_id}/gviz/tq?tqx=out:csv", self.export_base_url)
    }
}

#[async_trait]
impl FeedFetcher for SheetsFeedFetcher {
    #[tracing::instrument(skip(self), err(level = "debug"))]
    async fn fetch_csv(&self, document_id: &str) -> Result<FeedStream, FetchError> {
        let resp = self.client.get(self.export_url(document_id)).send().await?;
        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "Feed export responded");

        if !status.is_success() {
            return Err(FetchError::NotPublic(status.as_u16()));
        }

        Ok(resp.bytes_stream().map_err(std::io::Error::other).boxed())
    }
}
