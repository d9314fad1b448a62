use crate::adapters::transport::Transport;
use crate::config::DispatchConfig;
use crate::domain::recipient::Recipient;
use crate::domain::session::SessionStatus;
use crate::error::{AppError, Result};
use crate::services::DispatchLock;
use crate::services::session::SessionState;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    sent_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("sheet-relay");
        Self {
            sent_total: meter
                .u64_counter("sheet_relay_single_messages_total")
                .with_description("Total single messages sent through the API")
                .build(),
        }
    }
}

/// Session status and one-off sends.
#[derive(Clone, Debug)]
pub struct MessagingService {
    session: SessionState,
    transport: Arc<dyn Transport>,
    lock: DispatchLock,
    country_code: String,
    chat_id_suffix: String,
    metrics: Metrics,
}

impl MessagingService {
    #[must_use]
    pub fn new(session: SessionState, transport: Arc<dyn Transport>, lock: DispatchLock, config: &DispatchConfig) -> Self {
        Self {
            session,
            transport,
            lock,
            country_code: config.country_code.clone(),
            chat_id_suffix: config.chat_id_suffix.clone(),
            metrics: Metrics::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Sends a single message.
    ///
    /// # Errors
    /// Returns `AppError::TransportNotReady` if the session is not ready.
    /// Returns `AppError::BadRequest` if the recipient or body is blank.
    /// Returns `AppError::Busy` while a batch is being dispatched.
    /// Returns `AppError::DeliveryFailed` if the transport rejects the message.
    #[tracing::instrument(err(level = "warn"), skip(self, body))]
    pub async fn send_text(&self, recipient: &str, body: &str) -> Result<()> {
        if !self.session.is_ready() {
            return Err(AppError::TransportNotReady);
        }
        if body.trim().is_empty() {
            return Err(AppError::BadRequest("message body must not be empty".into()));
        }
        let recipient = Recipient::parse(recipient, &self.country_code)
            .ok_or_else(|| AppError::BadRequest("recipient must contain digits".into()))?;

        let _guard = self.lock.try_lock().map_err(|_| AppError::Busy)?;

        match self.transport.send(&recipient.chat_id(&self.chat_id_suffix), body).await {
            Ok(()) => {
                tracing::debug!(recipient = %recipient, "Message sent");
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, recipient = %recipient, "Send failed");
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                Err(AppError::DeliveryFailed)
            }
        }
    }
}
