use crate::config::Config;
use crate::services::batch_service::BatchService;
use crate::services::messaging_service::MessagingService;
use crate::services::session::SessionState;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod batch;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod schemas;
pub mod status;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub messaging_service: MessagingService,
    pub batch_service: BatchService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub session: SessionState,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub messaging_service: MessagingService,
    pub batch_service: BatchService,
}

/// Configures and returns the primary application router.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let state = AppState {
        config,
        messaging_service: services.messaging_service,
        batch_service: services.batch_service,
    };

    Router::new()
        .route("/status", get(status::session_status))
        .route("/messages/send", post(messages::send_text))
        .route("/batch/send", post(batch::send_batch))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
