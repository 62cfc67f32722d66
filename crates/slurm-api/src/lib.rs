#![allow(non_snake_case)]

pub mod collector;
pub mod registry;
pub mod routes;
pub mod sources;

use std::sync::Arc;

use axum::Router;
use slurm_providers::ProviderError;

pub use registry::{build_registry, FailurePolicy, ScrapeRegistry};

/// Why a scrape produced no exposition.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Command(#[from] ProviderError),

    #[error("metric error: {0}")]
    Metric(#[from] prometheus::Error),

    #[error("sample for undeclared gauge {0}")]
    UndeclaredGauge(&'static str),

    #[error("exposition is not valid UTF-8: {0}")]
    Encode(String),
}

impl ScrapeError {
    /// An external command failed, timed out or could not be started.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, ScrapeError::Command(_))
    }
}

/// Problems assembling the collector set at startup.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    #[error("metric {0} is registered twice")]
    DuplicateMetric(String),

    #[error("invalid metric descriptor: {0}")]
    Descriptor(#[from] prometheus::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ScrapeRegistry>,
}

impl AppState {
    pub fn new(registry: ScrapeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .with_state(state)
}
