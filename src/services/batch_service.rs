use crate::adapters::feed::FeedFetcher;
use crate::config::DispatchConfig;
use crate::domain::batch::{BatchReport, DispatchMode};
use crate::domain::feed::document_id;
use crate::error::{AppError, Result};
use crate::services::DispatchLock;
use crate::services::dispatch::{DeliveryPlan, DispatchEngine};
use crate::services::feed_parser::parse_feed;
use crate::services::report::aggregate;
use crate::services::session::SessionState;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    batches: Counter<u64>,
    batch_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("sheet-relay");
        Self {
            batches: meter
                .u64_counter("sheet_relay_batches_total")
                .with_description("Total batch requests by result")
                .build(),
            batch_size: meter
                .u64_histogram("sheet_relay_batch_deliveries")
                .with_description("Number of deliveries planned for a single batch")
                .build(),
        }
    }
}

/// Runs the feed → plan → dispatch → report pipeline.
#[derive(Clone, Debug)]
pub struct BatchService {
    session: SessionState,
    fetcher: Arc<dyn FeedFetcher>,
    engine: DispatchEngine,
    lock: DispatchLock,
    mode: DispatchMode,
    country_code: String,
    metrics: Metrics,
}

impl BatchService {
    #[must_use]
    pub fn new(
        session: SessionState,
        fetcher: Arc<dyn FeedFetcher>,
        engine: DispatchEngine,
        lock: DispatchLock,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            session,
            fetcher,
            engine,
            lock,
            mode: config.mode,
            country_code: config.country_code.clone(),
            metrics: Metrics::new(),
        }
    }

    /// Sends the messages found in the spreadsheet behind `feed_url`.
    ///
    /// The batch holds the dispatch lock for its whole duration and runs in its own task, so a
    /// caller going away does not stop it.
    ///
    /// # Errors
    /// Returns `AppError::TransportNotReady` if the session is not ready (no other work is done).
    /// Returns `AppError::InvalidLocator` if `feed_url` has no `/d/<id>` segment.
    /// Returns `AppError::Busy` if another dispatch holds the lock.
    /// Returns `AppError::FeedUnreachable` if the export cannot be fetched.
    /// Returns `AppError::FeedRead` if the export cannot be decoded.
    /// Returns `AppError::EmptyFeed` if no recipient or no message survives parsing.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn send_from_feed(&self, feed_url: &str) -> Result<BatchReport> {
        if !self.session.is_ready() {
            self.metrics.batches.add(1, &[KeyValue::new("result", "not_ready")]);
            return Err(AppError::TransportNotReady);
        }

        let Some(document_id) = document_id(feed_url).map(str::to_string) else {
            self.metrics.batches.add(1, &[KeyValue::new("result", "invalid_locator")]);
            return Err(AppError::InvalidLocator);
        };

        let Ok(guard) = Arc::clone(&self.lock).try_lock_owned() else {
            self.metrics.batches.add(1, &[KeyValue::new("result", "busy")]);
            return Err(AppError::Busy);
        };

        let this = self.clone();
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                this.run(&document_id).await
            }
            .in_current_span(),
        );

        let result = task.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Batch task aborted");
            Err(AppError::Internal)
        });

        let label = match &result {
            Ok(report) if report.total_failed == 0 => "success",
            Ok(_) => "partial",
            Err(_) => "error",
        };
        self.metrics.batches.add(1, &[KeyValue::new("result", label)]);
        result
    }

    async fn run(&self, document_id: &str) -> Result<BatchReport> {
        let stream = self.fetcher.fetch_csv(document_id).await.map_err(|e| {
            tracing::warn!(error = %e, "Feed fetch failed");
            AppError::FeedUnreachable
        })?;

        let reader = SyncIoBridge::new(StreamReader::new(stream));
        let parsed = tokio::task::spawn_blocking(move || parse_feed(reader))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Feed parser task failed");
                AppError::Internal
            })?
            .map_err(|e| AppError::FeedRead(e.to_string()))?;

        tracing::info!(
            rows_read = parsed.stats.rows_read,
            rows_dropped = parsed.stats.rows_dropped,
            "Feed parsed"
        );

        let plan = DeliveryPlan::build(parsed.rows, self.mode, &self.country_code);
        if plan.is_empty() {
            return Err(AppError::EmptyFeed);
        }

        self.metrics.batch_size.record(u64::try_from(plan.deliveries.len()).unwrap_or(u64::MAX), &[]);
        tracing::info!(
            recipients = plan.recipients.len(),
            messages = plan.messages.len(),
            deliveries = plan.deliveries.len(),
            "Dispatching batch"
        );

        let attempts = self.engine.dispatch(&plan).await;
        let report = aggregate(&plan, attempts);

        tracing::info!(total_sent = report.total_sent, total_failed = report.total_failed, "Batch finished");
        Ok(report)
    }
}
