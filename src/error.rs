use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Messaging session is not ready")]
    TransportNotReady,
    #[error("Invalid feed URL: expected a spreadsheet link containing /d/<id>")]
    InvalidLocator,
    #[error("Could not access the spreadsheet. Make sure anyone with the link can view it")]
    FeedUnreachable,
    #[error("The spreadsheet has no valid recipients or messages")]
    EmptyFeed,
    #[error("Failed to read the spreadsheet: {0}")]
    FeedRead(String),
    #[error("Failed to send message")]
    DeliveryFailed,
    #[error("Another dispatch is already in progress")]
    Busy,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::TransportNotReady => {
                tracing::warn!("Rejected request: messaging session is not ready");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidLocator | Self::EmptyFeed => {
                tracing::debug!(error = %self, "Bad feed");
                StatusCode::BAD_REQUEST
            }
            Self::FeedUnreachable => {
                tracing::debug!("Feed is not publicly readable");
                StatusCode::UNAUTHORIZED
            }
            Self::FeedRead(msg) => {
                tracing::error!(error = %msg, "Feed read error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::DeliveryFailed => {
                tracing::warn!("Single message delivery failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Busy => {
                tracing::debug!("Dispatch lock is held");
                StatusCode::CONFLICT
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                StatusCode::BAD_REQUEST
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
