use crate::adapters::transport::BridgeTransport;
use crate::config::TransportConfig;
use crate::domain::session::SessionStatus;
use crate::services::session::SessionState;
use std::time::Duration;
use tracing::Instrument;

/// Polls the messaging bridge and mirrors its session status into [`SessionState`].
#[derive(Debug)]
pub struct SessionMonitorWorker {
    bridge: BridgeTransport,
    session: SessionState,
    interval_secs: u64,
}

impl SessionMonitorWorker {
    #[must_use]
    pub fn new(bridge: BridgeTransport, session: SessionState, config: &TransportConfig) -> Self {
        Self { bridge, session, interval_secs: config.poll_interval_secs }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once().instrument(tracing::debug_span!("session_monitor_iteration")).await;
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Session monitor shutting down...");
    }

    /// Fetches the bridge status once and applies it. An unreachable bridge marks the session
    /// as disconnected.
    pub async fn poll_once(&self) {
        let next = match self.bridge.session_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Messaging bridge unreachable");
                SessionStatus::Disconnected
            }
        };
        self.session.transition(next);
    }
}
