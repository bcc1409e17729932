//! Router-level tests for the pipeline endpoints.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use diffscope::config::Config;
use diffscope::pipeline::{PipelineHandler, PipelineService};
use diffscope::queue::TaskQueue;
use diffscope::github::GithubClient;

use crate::gateway::create_router_with_state;
use crate::gateway::state::HandlerState;

fn test_router() -> Router {
    test_router_with_secret(None)
}

pub(crate) fn test_router_with_secret(webhook_secret: Option<String>) -> Router {
    let pipeline = Arc::new(PipelineService::new(Config::default()));
    let github = Arc::new(GithubClient::new(reqwest::Client::new(), None));
    let handler = Arc::new(PipelineHandler::new(pipeline.clone(), github));
    let queue = Arc::new(TaskQueue::start(16, handler));

    create_router_with_state(HandlerState::new(pipeline, queue, webhook_secret))
}

async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok_and_version() {
    let response = test_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn rank_with_no_files_returns_empty_ranking() {
    let (status, body) = post_json(
        test_router(),
        "/rank",
        serde_json::json!({ "pr_id": "42", "files": [] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr_id"], "42");
    assert_eq!(body["ranked_files"].as_array().unwrap().len(), 0);
    assert!(body["processing_ms"].is_u64());
}

#[tokio::test]
async fn rank_orders_security_file_above_test_file() {
    let (status, body) = post_json(
        test_router(),
        "/rank",
        serde_json::json!({
            "pr_id": "7",
            "files": [
                { "filename": "tests/login_test.py", "patch": "assert ok", "additions": 2, "deletions": 0 },
                { "filename": "src/auth/session.rs", "patch": "let token = mint();", "additions": 10, "deletions": 1 }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ranked = body["ranked_files"].as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["filename"], "src/auth/session.rs");
    assert_eq!(ranked[0]["rank"], 1);
    assert_eq!(ranked[1]["rank"], 2);
}

#[tokio::test]
async fn rank_rejects_missing_pr_id() {
    let (status, _) = post_json(test_router(), "/rank", serde_json::json!({ "files": [] })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cluster_small_input_yields_singletons() {
    let (status, body) = post_json(
        test_router(),
        "/cluster",
        serde_json::json!({
            "pr_id": "9",
            "files": [
                { "filename": "src/a.rs", "patch": "fn a() {}", "additions": 1, "deletions": 0 },
                { "filename": "src/b.rs", "patch": "fn b() {}", "additions": 1, "deletions": 0 }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr_id"], "9");
    let groups = body["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    for group in groups {
        assert_eq!(group["files"].as_array().unwrap().len(), 1);
        assert_eq!(group["coherence"], 1.0);
    }
}

#[tokio::test]
async fn retrieve_without_index_returns_tagged_empty() {
    let (status, body) = post_json(
        test_router(),
        "/retrieve",
        serde_json::json!({ "query_diff": "fn main() {}" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert_eq!(body["error"], "index_not_loaded");
}
