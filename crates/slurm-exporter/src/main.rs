#![allow(non_snake_case)]

mod config;

use std::sync::Arc;

use clap::Parser;
use slurm_api::{api_router, build_registry, AppState};
use slurm_providers::{clusters, CommandRunner, SystemRunner};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Cli, Config};

fn fatal(message: impl std::fmt::Display) -> ! {
    error!("{message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let appConfig = Config::load(&cli).unwrap_or_else(|e| fatal(e));

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(appConfig.command_timeout));

    // Unknown clusters must fail before the listener is bound.
    let known = clusters::discover(runner.as_ref()).await;
    let clusterSet = known
        .resolve(&appConfig.clusters)
        .unwrap_or_else(|e| fatal(e));

    let registry = build_registry(
        runner,
        clusterSet,
        appConfig.on_command_failure,
        appConfig.gpus_acct,
    )
    .unwrap_or_else(|e| fatal(e));

    let addr = appConfig.listen_address.clone();
    info!(
        "starting slurm-exporter on {addr}: clusters={} gpus_acct={} on_command_failure={} command_timeout={:?}",
        registry.clusters().names().join(","),
        appConfig.gpus_acct,
        appConfig.on_command_failure,
        appConfig.command_timeout,
    );

    let app = api_router(AppState::new(registry)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fatal(format!("failed to bind to {addr}: {e}")));

    info!("listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        fatal(format!("server exited with error: {e}"));
    }
}
