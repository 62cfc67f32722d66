use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/health", get(health))
}

/// Runs a full scrape. A command failure that reaches this point means the
/// registry is in `exit` mode, so the process terminates.
async fn get_metrics(State(state): State<AppState>) -> Response {
    match state.registry.gather().await {
        Ok(body) => {
            let contentType = TextEncoder::new().format_type().to_string();
            ([(header::CONTENT_TYPE, contentType)], body).into_response()
        }
        Err(e) if e.is_command_failure() => {
            error!("scrape failed, exiting: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("scrape failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}
