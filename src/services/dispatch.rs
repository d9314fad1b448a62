use crate::adapters::transport::Transport;
use crate::config::DispatchConfig;
use crate::domain::batch::{DeliveryAttempt, DeliveryOutcome, DispatchMode, PlannedDelivery};
use crate::domain::feed::FeedRow;
use crate::domain::recipient::Recipient;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
struct Metrics {
    attempts: Counter<u64>,
    send_duration: Histogram<f64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("sheet-relay");
        Self {
            attempts: meter
                .u64_counter("sheet_relay_delivery_attempts_total")
                .with_description("Total delivery attempts made against the transport")
                .build(),
            send_duration: meter
                .f64_histogram("sheet_relay_send_duration_seconds")
                .with_description("Time spent in a single transport send")
                .build(),
        }
    }
}

/// The ordered list of deliveries for one batch, along with the distinct recipients and messages
/// it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub mode: DispatchMode,
    pub recipients: Vec<Recipient>,
    pub messages: Vec<String>,
    pub deliveries: Vec<PlannedDelivery>,
}

impl DeliveryPlan {
    /// Expands parsed rows into deliveries.
    ///
    /// Paired mode keeps one delivery per row. Cross-product mode sends every distinct message to
    /// every distinct recipient, recipient-major. Both keep first-encounter order. Rows whose
    /// recipient normalizes to nothing are skipped.
    #[must_use]
    pub fn build(rows: Vec<FeedRow>, mode: DispatchMode, country_code: &str) -> Self {
        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            match Recipient::parse(&row.recipient, country_code) {
                Some(recipient) => pairs.push((recipient, row.body)),
                None => tracing::debug!(raw = %row.recipient, "Skipping row without a usable recipient"),
            }
        }

        let recipients = distinct(pairs.iter().map(|(r, _)| r.clone()));
        let messages = distinct(pairs.iter().map(|(_, b)| b.clone()));

        let deliveries = match mode {
            DispatchMode::Paired => {
                pairs.into_iter().map(|(recipient, body)| PlannedDelivery { recipient, body }).collect()
            }
            DispatchMode::CrossProduct => recipients
                .iter()
                .flat_map(|recipient| {
                    messages.iter().map(move |body| PlannedDelivery { recipient: recipient.clone(), body: body.clone() })
                })
                .collect(),
        };

        Self { mode, recipients, messages, deliveries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty() || self.messages.is_empty()
    }
}

fn distinct<T: Clone + Eq + Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

/// Waits inserted between consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub intra_recipient: Duration,
    pub inter_recipient: Duration,
}

impl Pacing {
    #[must_use]
    pub const fn from_config(config: &DispatchConfig) -> Self {
        Self {
            intra_recipient: Duration::from_millis(config.intra_recipient_delay_ms),
            inter_recipient: Duration::from_millis(config.inter_recipient_delay_ms),
        }
    }

    /// Spacing before `next` given that `current` just finished.
    #[must_use]
    pub fn between(&self, mode: DispatchMode, current: &PlannedDelivery, next: &PlannedDelivery) -> Duration {
        match mode {
            DispatchMode::Paired => self.inter_recipient,
            DispatchMode::CrossProduct if current.recipient == next.recipient => self.intra_recipient,
            DispatchMode::CrossProduct => self.inter_recipient,
        }
    }
}

/// Executes a [`DeliveryPlan`] against the transport, one attempt at a time.
#[derive(Clone, Debug)]
pub struct DispatchEngine {
    transport: Arc<dyn Transport>,
    pacing: Pacing,
    chat_id_suffix: String,
    metrics: Metrics,
}

impl DispatchEngine {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, pacing: Pacing, chat_id_suffix: String) -> Self {
        Self { transport, pacing, chat_id_suffix, metrics: Metrics::new() }
    }

    /// Sends every planned delivery in order. Each attempt completes before the next one starts and
    /// failures are recorded rather than propagated. There are no retries.
    #[tracing::instrument(skip_all, fields(mode = ?plan.mode, deliveries = plan.deliveries.len()))]
    pub async fn dispatch(&self, plan: &DeliveryPlan) -> Vec<DeliveryAttempt> {
        let total = plan.deliveries.len();
        let mut attempts = Vec::with_capacity(total);

        for (sequence, delivery) in plan.deliveries.iter().enumerate() {
            tracing::info!(
                sequence = sequence + 1,
                total,
                recipient = %delivery.recipient,
                "Sending message"
            );
            attempts.push(self.attempt(sequence, delivery).await);

            if let Some(next) = plan.deliveries.get(sequence + 1) {
                let wait = self.pacing.between(plan.mode, delivery, next);
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
            }
        }

        attempts
    }

    async fn attempt(&self, sequence: usize, delivery: &PlannedDelivery) -> DeliveryAttempt {
        let chat_id = delivery.recipient.chat_id(&self.chat_id_suffix);
        let started = tokio::time::Instant::now();
        let result = self.transport.send(&chat_id, &delivery.body).await;
        self.metrics.send_duration.record(started.elapsed().as_secs_f64(), &[]);

        let (outcome, error) = match result {
            Ok(()) => {
                self.metrics.attempts.add(1, &[KeyValue::new("status", "sent")]);
                (DeliveryOutcome::Sent, None)
            }
            Err(e) => {
                tracing::warn!(error = %e, recipient = %delivery.recipient, "Delivery attempt failed");
                self.metrics.attempts.add(1, &[KeyValue::new("status", "failed")]);
                (DeliveryOutcome::Failed, Some(e.to_string()))
            }
        };

        DeliveryAttempt {
            sequence,
            recipient: delivery.recipient.clone(),
            body: delivery.body.clone(),
            outcome,
            error,
        }
    }
}
