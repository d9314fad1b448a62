#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::feed::{FeedFetcher, SheetsFeedFetcher};
use crate::adapters::transport::{BridgeTransport, Transport};
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::DispatchLock;
use crate::services::batch_service::BatchService;
use crate::services::dispatch::{DispatchEngine, Pacing};
use crate::services::messaging_service::MessagingService;
use crate::services::session::SessionState;
use crate::workers::SessionMonitorWorker;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Background tasks owned by the application.
#[derive(Debug, Default)]
pub struct Workers {
    session_monitor: Option<SessionMonitorWorker>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(monitor) = self.session_monitor {
            tasks.push(tokio::spawn(monitor.run(shutdown_rx).instrument(tracing::info_span!("session_monitor"))));
        }
        tasks
    }
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub session: SessionState,
    pub workers: Workers,
}

/// Wires services together. Collaborators that are not supplied are built from the config.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    session: Option<SessionState>,
    transport: Option<Arc<dyn Transport>>,
    fetcher: Option<Arc<dyn FeedFetcher>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, session: None, transport: None, fetcher: None }
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = Some(session);
        self
    }

    /// Uses `transport` instead of the messaging bridge. No session monitor is started; the
    /// caller drives the session state.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_feed_fetcher(mut self, fetcher: Arc<dyn FeedFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// # Errors
    /// Returns an error if an HTTP client for a default collaborator cannot be built.
    pub fn build(self) -> anyhow::Result<App> {
        let config = self.config;
        let session = self.session.unwrap_or_default();

        let mut workers = Workers::default();
        let transport: Arc<dyn Transport> = if let Some(transport) = self.transport {
            transport
        } else {
            let bridge = BridgeTransport::new(&config.transport)?;
            workers.session_monitor =
                Some(SessionMonitorWorker::new(bridge.clone(), session.clone(), &config.transport));
            Arc::new(bridge)
        };

        let fetcher: Arc<dyn FeedFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(SheetsFeedFetcher::new(&config.feed)?),
        };

        let lock: DispatchLock = Arc::new(Mutex::new(()));
        let engine = DispatchEngine::new(
            Arc::clone(&transport),
            Pacing::from_config(&config.dispatch),
            config.dispatch.chat_id_suffix.clone(),
        );

        let messaging_service =
            MessagingService::new(session.clone(), Arc::clone(&transport), Arc::clone(&lock), &config.dispatch);
        let batch_service = BatchService::new(session.clone(), fetcher, engine, lock, &config.dispatch);

        Ok(App { services: ServiceContainer { messaging_service, batch_service }, session, workers })
    }
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {}
            () = terminate => {}
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(panic.location = %location, panic.payload = %payload, "Panic occurred");
    }));
}
