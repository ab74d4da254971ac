use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use super::{AppState, create_router};
use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;
use crate::testing::{MockFetcher, MockLlm, sample_content};

const ROOT: &str = "https://acme.test/";

const GOLDEN: &str = r#"{"why": {"statement": "Calm teams", "score": 80}, "how": {"score": 60}, "what": {"score": 70}, "who": {"score": 55}, "overallScore": 66}"#;
const INSIGHTS: &str = r#"{"strategicSummary": "Acme sells calm.", "recommendations": []}"#;

fn app(fetcher: Arc<MockFetcher>, llm: Arc<MockLlm>) -> Router {
    let pipeline = Pipeline::new(fetcher, llm, PipelineConfig::default(), 8000);
    create_router(AppState::new(pipeline))
}

fn model() -> MockLlm {
    MockLlm::replying("mock", GOLDEN).replying_when("chief marketing strategist", INSIGHTS)
}

async fn post(app: Router, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_body(value: Value) -> Body {
    Body::from(value.to_string())
}

#[tokio::test]
async fn test_health() {
    let app = app(
        Arc::new(MockFetcher::failing()),
        Arc::new(model()),
    );
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["browser"], false);
}

#[tokio::test]
async fn test_non_url_is_rejected_before_any_call() {
    let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
    let llm = Arc::new(model());

    for uri in [
        "/api/analyze/comprehensive",
        "/api/analyze/phase1-complete",
        "/api/analyze/step-by-step",
    ] {
        let (status, body) = post(
            app(fetcher.clone(), llm.clone()),
            uri,
            json_body(json!({"url": "definitely not a url"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "INVALID_URL");
        assert!(body["message"].is_string());
    }

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_missing_url_and_unknown_framework() {
    let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
    let llm = Arc::new(model());

    let (status, body) = post(
        app(fetcher.clone(), llm.clone()),
        "/api/analyze/comprehensive",
        json_body(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_URL");

    let (status, body) = post(
        app(fetcher.clone(), llm.clone()),
        "/api/analyze/comprehensive",
        json_body(json!({"url": ROOT, "frameworks": ["swot"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_FRAMEWORK");

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_request() {
    let (status, body) = post(
        app(Arc::new(MockFetcher::failing()), Arc::new(model())),
        "/api/analyze/comprehensive",
        Body::from("{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_comprehensive_success() {
    let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
    let (status, body) = post(
        app(fetcher, Arc::new(model())),
        "/api/analyze/comprehensive",
        json_body(json!({"url": ROOT, "frameworks": ["golden-circle"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["frameworks"][0]["status"], "succeeded");
    assert_eq!(body["data"]["report"]["overallScore"], 66);
    assert_eq!(body["data"]["insights"]["status"], "available");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_fetch_failure_is_server_error() {
    let (status, body) = post(
        app(Arc::new(MockFetcher::failing()), Arc::new(model())),
        "/api/analyze/comprehensive",
        json_body(json!({"url": ROOT})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body.get("error").is_none());
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to scrape website content"));
}

#[tokio::test]
async fn test_step_by_step_failure_keeps_steps() {
    let (status, body) = post(
        app(Arc::new(MockFetcher::failing()), Arc::new(model())),
        "/api/analyze/step-by-step",
        json_body(json!({"url": ROOT})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["data"]["steps"][0]["name"], "fetch-content");
    assert_eq!(body["data"]["steps"][0]["status"], "failed");
    assert!(body["data"]["result"].is_null());
}

#[tokio::test]
async fn test_phases_chain_through_the_api() {
    let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
    let llm = Arc::new(model());

    let (status, phase1) = post(
        app(fetcher.clone(), llm.clone()),
        "/api/analyze/phase1-complete",
        json_body(json!({"url": ROOT})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase1["data"]["content"]["title"], "Acme Widgets");
    assert_eq!(phase1["data"]["lighthouse"]["status"], "unavailable");

    let (status, phase2) = post(
        app(fetcher.clone(), llm.clone()),
        "/api/analyze/phase2-frameworks",
        json_body(json!({
            "url": ROOT,
            "phase1": phase1["data"],
            "frameworks": ["golden-circle"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase2["data"]["frameworks"][0]["framework"], "golden-circle");

    let (status, phase3) = post(
        app(fetcher.clone(), llm.clone()),
        "/api/analyze/phase3-complete",
        json_body(json!({
            "url": ROOT,
            "phase1": phase1["data"],
            "phase2": phase2["data"]["frameworks"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase3["data"]["insights"]["value"]["strategicSummary"], "Acme sells calm.");

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_phase2_missing_phase1_is_invalid_request() {
    let llm = Arc::new(model());
    let (status, body) = post(
        app(Arc::new(MockFetcher::failing()), llm.clone()),
        "/api/analyze/phase2-frameworks",
        json_body(json!({"url": ROOT})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");
    assert_eq!(llm.calls(), 0);
}
