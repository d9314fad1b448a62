use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: ready once the messaging session is.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let status = state.session.status();
    let status_code = if status.is_ready() {
        StatusCode::OK
    } else {
        tracing::debug!(session = status.label(), "Readiness probe failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if status.is_ready() { "ok" } else { "error" }.to_string(),
        session: status.label().to_string(),
    };

    (status_code, Json(response))
}
