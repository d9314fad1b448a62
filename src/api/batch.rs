use crate::api::AppState;
use crate::api::middleware::ApiJson;
use crate::api::schemas::SuccessResponse;
use crate::api::schemas::batch::BatchSendRequest;
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

/// Reads the spreadsheet behind `feedUrl` and sends its messages.
///
/// Partial delivery failures are reported in the body with a 200 status.
///
/// # Errors
/// See [`crate::services::batch_service::BatchService::send_from_feed`].
pub async fn send_batch(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BatchSendRequest>,
) -> Result<impl IntoResponse> {
    let report = state.batch_service.send_from_feed(&payload.feed_url).await?;
    Ok(Json(SuccessResponse::new(report)))
}
