use axum::{extract::State, routing::get, Json, Router};
use slurm_types::ClusterSet;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/clusters", get(get_clusters))
}

async fn get_clusters(State(state): State<AppState>) -> Json<ClusterSet> {
    Json(state.registry.clusters().clone())
}
