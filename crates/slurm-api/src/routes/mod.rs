pub mod clusters;
pub mod metrics;

use axum::Router;

use crate::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(metrics::routes())
        .merge(clusters::routes())
}
