/// Connection state of the messaging client session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Connecting,
    /// The client is waiting for a login artifact (e.g. a QR code) to be scanned.
    AwaitingLogin { login_code: String },
    Ready,
    Disconnected,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub fn login_code(&self) -> Option<&str> {
        match self {
            Self::AwaitingLogin { login_code } => Some(login_code.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::AwaitingLogin { .. } => "awaiting_login",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
        }
    }
}
