use crate::domain::recipient::Recipient;
use clap::ValueEnum;
use serde::Serialize;

/// How accepted feed rows are expanded into deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum DispatchMode {
    /// Each row is one recipient/body pair, sent once.
    Paired,
    /// Every distinct recipient receives every distinct body.
    #[default]
    CrossProduct,
}

/// A single (recipient, body) pair scheduled for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelivery {
    pub recipient: Recipient,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

/// One delivery actually attempted against the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttempt {
    pub sequence: usize,
    pub recipient: Recipient,
    pub body: String,
    pub outcome: DeliveryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryAttempt {
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Sent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcome {
    pub recipient: Recipient,
    pub messages_sent: usize,
    pub messages_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub mode: DispatchMode,
    pub recipients: Vec<Recipient>,
    pub messages: Vec<String>,
    pub total_sent: usize,
    pub total_failed: usize,
    pub per_recipient: Vec<RecipientOutcome>,
    pub attempts: Vec<DeliveryAttempt>,
}
