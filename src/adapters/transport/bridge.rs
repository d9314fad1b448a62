use crate::adapters::transport::{Transport, TransportError};
use crate::config::TransportConfig;
use crate::domain::session::SessionStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    body: &'a str,
}

/// Session report returned by the bridge's `GET /session`.
#[derive(Debug, Deserialize)]
struct SessionReport {
    ready: bool,
    #[serde(default)]
    qr: Option<String>,
}

impl From<SessionReport> for SessionStatus {
    fn from(report: SessionReport) -> Self {
        match (report.ready, report.qr) {
            (true, _) => Self::Ready,
            (false, Some(login_code)) if !login_code.is_empty() => Self::AwaitingLogin { login_code },
            (false, _) => Self::Connecting,
        }
    }
}

/// Talks to a messaging bridge process that owns the actual client session.
#[derive(Clone, Debug)]
pub struct BridgeTransport {
    client: reqwest::Client,
    base_url: String,
}

impl BridgeTransport {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &TransportConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs)).build()?;
        Ok(Self { client, base_url: config.bridge_url.trim_end_matches('/').to_string() })
    }

    /// Asks the bridge for the current state of its session.
    ///
    /// # Errors
    /// Returns `TransportError::Request` if the bridge is unreachable or answers with an error status.
    pub async fn session_status(&self) -> Result<SessionStatus, TransportError> {
        let report: SessionReport = self
            .client
            .get(format!("{}/session", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(report.into())
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn send(&self, chat_id: &str, body: &str) -> Result<(), TransportError> {
        tracing::debug!(chat_id = %chat_id, "Forwarding message to bridge");
        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&SendRequest { chat_id, body })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = resp.text().await.unwrap_or_default();
        Err(TransportError::Rejected(format!("{}: {}", status.as_u16(), detail.trim())))
    }
}
