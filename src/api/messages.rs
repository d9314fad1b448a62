use crate::api::AppState;
use crate::api::middleware::ApiJson;
use crate::api::schemas::MessageResponse;
use crate::api::schemas::messaging::SendTextRequest;
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

/// Sends a single text message.
///
/// # Errors
/// Returns `AppError::TransportNotReady` or `AppError::DeliveryFailed` (500) if the message could not
/// be sent, `AppError::BadRequest` for blank fields and `AppError::Busy` while a batch is running.
pub async fn send_text(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendTextRequest>,
) -> Result<impl IntoResponse> {
    state.messaging_service.send_text(&payload.recipient, &payload.body).await?;
    Ok(Json(MessageResponse::success("Message sent successfully")))
}
