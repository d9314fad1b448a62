use crate::domain::session::SessionStatus;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared view of the messaging session, injected into every component that needs readiness.
#[derive(Clone, Debug)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionStatus>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_status(SessionStatus::Connecting)
    }

    #[must_use]
    pub fn with_status(status: SessionStatus) -> Self {
        let (tx, _rx) = watch::channel(status);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.tx.borrow().is_ready()
    }

    /// The pending login artifact, present only while the session waits for login.
    #[must_use]
    pub fn login_code(&self) -> Option<String> {
        self.tx.borrow().login_code().map(ToString::to_string)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.tx.borrow().clone()
    }

    /// Applies a session event. Returns `true` if the status changed.
    pub fn transition(&self, next: SessionStatus) -> bool {
        let label = next.label();
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            tracing::info!(status = label, "Messaging session status changed");
        }
        changed
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
