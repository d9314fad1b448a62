use crate::domain::session::SessionStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTextRequest {
    pub recipient: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub ready: bool,
    pub login_code: Option<String>,
}

impl From<SessionStatus> for SessionStatusResponse {
    fn from(status: SessionStatus) -> Self {
        Self { ready: status.is_ready(), login_code: status.login_code().map(ToString::to_string) }
    }
}
