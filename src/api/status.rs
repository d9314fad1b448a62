use crate::api::AppState;
use crate::api::schemas::SuccessResponse;
use crate::api::schemas::messaging::SessionStatusResponse;
use axum::{Json, extract::State, response::IntoResponse};

/// Reports whether the messaging session is ready and, while it is not, the pending login code.
pub async fn session_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.messaging_service.status();
    Json(SuccessResponse::new(SessionStatusResponse::from(status)))
}
