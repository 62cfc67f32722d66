#![allow(non_snake_case)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use slurm_api::{api_router, build_registry, AppState, FailurePolicy};
use slurm_providers::fake::FakeRunner;
use slurm_types::{ClusterInfo, ClusterSet};
use tower::ServiceExt;

fn cluster_fixture() -> FakeRunner {
    FakeRunner::new()
        .reply("sinfo", &["-M", "virgo", "%C"], "CLUSTER: virgo\n10/20/2/32\n")
        .reply("sinfo", &["%C"], "4/4/0/8\n")
        .reply("sinfo", &["%D,%T"], "2,idle\n1,mixed\n")
        .reply("sinfo", &["%R,%C"], "gpu,2/2/0/4\n")
        .reply("squeue", &["%P"], "gpu\ngpu,cpu\n")
        .reply("squeue", &["%A,%T,%r"], "1,PENDING,Dependency\n2,RUNNING,None\n")
        .reply("sacct", &[], "board:a100:2\n")
        .reply("sinfo", &["%n %G"], "n1 board:a100:4\n")
        .fail("sdiag", &[])
}

fn app(runner: FakeRunner, clusters: ClusterSet, policy: FailurePolicy) -> axum::Router {
    let registry = build_registry(Arc::new(runner), clusters, policy, true).unwrap();
    api_router(AppState::new(registry))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_every_cluster() {
    let clusters = ClusterSet::new(vec![ClusterInfo::local(), ClusterInfo::remote("virgo")]);
    let app = app(cluster_fixture(), clusters, FailurePolicy::Skip);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contentType = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(contentType.starts_with("text/plain"));

    let text = body_text(response).await;
    assert!(text.contains("slurm_cpus_total{cluster=\"local\"} 8"));
    assert!(text.contains("slurm_cpus_total{cluster=\"virgo\"} 32"));
    assert!(text.contains("slurm_nodes_idle{cluster=\"local\"} 2"));
    assert!(text.contains("slurm_nodes_mix{cluster=\"local\"} 1"));
    assert!(text.contains("slurm_partition_jobs_pending{cluster=\"local\",partition=\"gpu\"} 2"));
    assert!(text.contains("slurm_queue_pending_dependency{cluster=\"local\"} 1"));
    assert!(text.contains("slurm_queue_running{cluster=\"local\"} 1"));
    assert!(text.contains("slurm_gpus_type_total{cluster=\"local\",type=\"a100\"} 4"));
    assert!(text.contains("slurm_gpus_utilization{cluster=\"local\"} 0.5"));
    // sdiag failed and the scrape is in skip mode
    assert!(!text.contains("slurm_scheduler_threads"));
}

#[tokio::test]
async fn test_metrics_endpoint_is_repeatable() {
    let clusters = ClusterSet::new(vec![ClusterInfo::local()]);
    let app = app(cluster_fixture(), clusters, FailurePolicy::Skip);

    let first = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(first).await, body_text(second).await);
}

#[tokio::test]
async fn test_clusters_endpoint() {
    let clusters = ClusterSet::new(vec![ClusterInfo::local(), ClusterInfo::remote("virgo")]);
    let app = app(FakeRunner::new(), clusters, FailurePolicy::Exit);

    let response = app
        .oneshot(Request::get("/api/v1/clusters").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json[0]["name"], "local");
    assert_eq!(json[0]["cmdargs"].as_array().unwrap().len(), 0);
    assert_eq!(json[1]["name"], "virgo");
    assert_eq!(json[1]["cmdargs"][1], "virgo");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(FakeRunner::new(), ClusterSet::new(vec![ClusterInfo::local()]), FailurePolicy::Exit);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
