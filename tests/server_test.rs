//! HTTP-level tests for the relay entry points, with a mocked upstream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use commitdiff::llm::OpenRouterClient;
use commitdiff::rate_limit::{MemoryStore, RateLimiter};
use commitdiff::server::{router, AppState};
use commitdiff::GenerationService;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "openai/gpt-4o-mini";

fn completion(content: &str) -> Value {
    json!({
        "id": "gen-test",
        "model": MODEL,
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": content }
        }]
    })
}

async fn upstream_returning(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn app_with_limiter(upstream: &MockServer, limiter: RateLimiter) -> Router {
    let client =
        OpenRouterClient::new("sk-test".to_string(), MODEL.to_string(), upstream.uri()).unwrap();
    router(AppState::new(
        GenerationService::new(Arc::new(client)),
        limiter,
    ))
}

fn app(upstream: &MockServer) -> Router {
    app_with_limiter(upstream, RateLimiter::new(Arc::new(MemoryStore::new())))
}

async fn post_raw(app: &Router, uri: &str, body: String, ip: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(ip) = ip {
        request = request.header("x-forwarded-for", ip);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post(app: &Router, uri: &str, body: Value, ip: Option<&str>) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string(), ip).await
}

#[tokio::test]
async fn health_check() {
    let upstream = MockServer::start().await;
    let response = app(&upstream)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn both_entry_points_return_commit_message() {
    let upstream = upstream_returning(ResponseTemplate::new(200).set_body_json(completion(
        r#"{"title":"feat(api): add relay","summary":"- adds relay"}"#,
    )))
    .await;
    let app = app(&upstream);

    for uri in ["/api/generate", "/api/cli-generate"] {
        let (status, body) = post(&app, uri, json!({ "diff": "+relay" }), Some("1.1.1.1")).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(
            body,
            json!({ "title": "feat(api): add relay", "summary": "- adds relay" })
        );
    }
}

#[tokio::test]
async fn synonym_fields_are_normalized() {
    let upstream = upstream_returning(ResponseTemplate::new(200).set_body_json(completion(
        r#"{"message":"fix: trim input","description":"- trims"}"#,
    )))
    .await;

    let (status, body) = post(&app(&upstream), "/api/generate", json!({ "diff": "+x" }), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "fix: trim input");
    assert_eq!(body["summary"], "- trims");
}

#[tokio::test]
async fn invalid_diffs_are_rejected_without_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&upstream)
        .await;
    let app = app(&upstream);

    let bodies = [
        json!({ "diff": "" }),
        json!({ "diff": "   \n" }),
        json!({ "diff": 12 }),
        json!({ "diff": null }),
        json!({}),
    ];
    for uri in ["/api/generate", "/api/cli-generate"] {
        for body in &bodies {
            let (status, response) = post(&app, uri, body.clone(), Some("2.2.2.2")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(response, json!({ "error": "Invalid diff provided" }));
        }
        let (status, _) = post_raw(&app, uri, "not json".to_string(), Some("2.2.2.2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn size_cap_boundary() {
    let upstream = upstream_returning(
        ResponseTemplate::new(200).set_body_json(completion(r#"{"title":"t","summary":"s"}"#)),
    )
    .await;
    let app = app(&upstream);

    let (status, _) = post(&app, "/api/generate", json!({ "diff": "a".repeat(50_000) }), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        post(&app, "/api/generate", json!({ "diff": "a".repeat(50_001) }), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Diff too large (max 50000 characters)");

    // The rate-limited entry point has no ceiling.
    let (status, _) = post(
        &app,
        "/api/cli-generate",
        json!({ "diff": "a".repeat(50_001) }),
        Some("3.3.3.3"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limited_entry_point_accepts_multi_megabyte_diffs() {
    let upstream = upstream_returning(
        ResponseTemplate::new(200).set_body_json(completion(r#"{"title":"chore: bump lockfile","summary":"s"}"#)),
    )
    .await;
    let diff = "+a\n".repeat(1_000_000);

    let (status, body) = post(
        &app(&upstream),
        "/api/cli-generate",
        json!({ "diff": diff }),
        Some("7.7.7.7"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "chore: bump lockfile");
}

#[tokio::test]
async fn oversized_body_on_size_capped_entry_point_is_413() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&upstream)
        .await;
    let diff = "+a\n".repeat(1_000_000);

    let (status, body) = post(&app(&upstream), "/api/generate", json!({ "diff": diff }), None).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({ "error": "Request body too large" }));
}

#[tokio::test]
async fn eleventh_request_is_rate_limited_then_window_resets() {
    let upstream = upstream_returning(
        ResponseTemplate::new(200).set_body_json(completion(r#"{"title":"t","summary":"s"}"#)),
    )
    .await;
    let clock = Arc::new(AtomicU64::new(1_700_000_000_000));
    let limiter = {
        let clock = clock.clone();
        RateLimiter::new(Arc::new(MemoryStore::new())).with_clock(move || clock.load(Ordering::SeqCst))
    };
    let app = app_with_limiter(&upstream, limiter);

    for i in 0..10 {
        let (status, _) = post(&app, "/api/cli-generate", json!({ "diff": "+x" }), Some("4.4.4.4")).await;
        assert_eq!(status, StatusCode::OK, "request {i}");
    }
    let (status, body) =
        post(&app, "/api/cli-generate", json!({ "diff": "+x" }), Some("4.4.4.4")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({ "error": "Too many requests. Please try again later." })
    );

    // Another caller is unaffected, and the size-capped route is never limited.
    let (status, _) = post(&app, "/api/cli-generate", json!({ "diff": "+x" }), Some("5.5.5.5")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/api/generate", json!({ "diff": "+x" }), Some("4.4.4.4")).await;
    assert_eq!(status, StatusCode::OK);

    clock.fetch_add(10_000, Ordering::SeqCst);
    let (status, _) = post(&app, "/api/cli-generate", json!({ "diff": "+x" }), Some("4.4.4.4")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn callers_without_address_share_one_bucket() {
    let upstream = upstream_returning(
        ResponseTemplate::new(200).set_body_json(completion(r#"{"title":"t","summary":"s"}"#)),
    )
    .await;
    let app = app(&upstream);

    for _ in 0..10 {
        let (status, _) = post(&app, "/api/cli-generate", json!({ "diff": "+x" }), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = post(&app, "/api/cli-generate", json!({ "diff": "+x" }), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn upstream_server_error_is_reported_without_result() {
    let upstream =
        upstream_returning(ResponseTemplate::new(500).set_body_string("provider exploded")).await;

    let (status, body) = post(&app(&upstream), "/api/generate", json!({ "diff": "+x" }), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to generate commit message" }));
}

#[tokio::test]
async fn upstream_auth_error_is_bad_gateway() {
    let upstream =
        upstream_returning(ResponseTemplate::new(401).set_body_string("invalid api key")).await;

    let (status, body) =
        post(&app(&upstream), "/api/cli-generate", json!({ "diff": "+x" }), Some("6.6.6.6")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.get("title").is_none());
    assert!(!body.to_string().contains("invalid api key"));
}

#[tokio::test]
async fn unparseable_model_output_is_internal_error() {
    let upstream = upstream_returning(
        ResponseTemplate::new(200).set_body_json(completion("feat: this is not json")),
    )
    .await;

    let (status, body) = post(&app(&upstream), "/api/generate", json!({ "diff": "+x" }), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}
