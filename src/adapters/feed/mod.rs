use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

pub mod sheets;

pub use sheets::SheetsFeedFetcher;

/// Raw CSV bytes as they arrive from the network.
pub type FeedStream = BoxStream<'static, std::io::Result<Bytes>>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Feed is not publicly readable (status {0})")]
    NotPublic(u16),
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait FeedFetcher: Send + Sync + std::fmt::Debug {
    /// Opens the CSV export of the spreadsheet identified by `document_id`.
    ///
    /// # Errors
    /// Returns `FetchError::NotPublic` if the export answered with a non-success status.
    async fn fetch_csv(&self, document_id: &str) -> Result<FeedStream, FetchError>;
}
