use async_trait::async_trait;
use thiserror::Error;

pub mod bridge;

pub use bridge::BridgeTransport;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Transport rejected the message: {0}")]
    Rejected(String),
}

/// The messaging client session. One call sends one message.
///
/// Readiness is tracked separately by [`crate::services::session::SessionState`].
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends `body` verbatim to `chat_id`.
    ///
    /// # Errors
    /// Returns `TransportError` if the session refused or failed to deliver the message.
    async fn send(&self, chat_id: &str, body: &str) -> Result<(), TransportError>;
}
