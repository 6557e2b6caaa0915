//! HTTP 接口集成测试

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use translate_gateway::pipeline::RequestPipeline;
use translate_gateway::web::{create_router, AppState, CACHE_STATUS_HEADER};

use common::{translate_uri, validator, CountingTranslator, FailingTranslator, TestEnvironment, BROWSER_UA};

fn router(pipeline: RequestPipeline) -> Router {
    create_router(Arc::new(AppState::new(pipeline)))
}

async fn get(app: &Router, uri: &str, user_agent: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(ua) = user_agent {
        request = request.header(header::USER_AGENT, ua);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_index_says_hello() {
    let app = router(TestEnvironment::without_cache().pipeline);

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Hello World");
}

#[tokio::test]
async fn test_translate_miss_then_hit() {
    let env = TestEnvironment::with_cache();
    let app = router(env.pipeline.clone());
    let uri = translate_uri(&["hello", "world"], "es", "valid");

    let first = get(&app, &uri, Some(BROWSER_UA)).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[CACHE_STATUS_HEADER], "MISS");
    assert_eq!(
        json_body(first).await,
        CountingTranslator::expected_body(&["hello", "world"], "es")
    );

    let second = get(&app, &uri, Some(BROWSER_UA)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()[CACHE_STATUS_HEADER], "HIT");
    assert_eq!(
        json_body(second).await,
        CountingTranslator::expected_body(&["hello", "world"], "es")
    );

    assert_eq!(env.translator.calls(), 1);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let env = TestEnvironment::without_cache();
    let app = router(env.pipeline.clone());

    let response = get(&app, &translate_uri(&["hello"], "es", ""), Some(BROWSER_UA)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["error"], "token validation failed");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
    assert_eq!(env.translator.calls(), 0);
}

#[tokio::test]
async fn test_missing_parameters_are_a_bad_request() {
    let app = router(TestEnvironment::without_cache().pipeline);

    for uri in ["/translate", "/translate?target=es&token=valid", "/translate?q=%%%&target=es"] {
        let response = get(&app, uri, Some(BROWSER_UA)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {}", uri);
        let body = json_body(response).await;
        assert_eq!(body["error"], "parameter validation failed");
    }
}

#[tokio::test]
async fn test_crawler_is_forbidden() {
    let env = TestEnvironment::without_cache();
    let app = router(env.pipeline.clone());

    let response = get(&app, &translate_uri(&["hello"], "es", "valid"), Some("curl/8.0")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid request");
    assert!(body["details"].as_str().unwrap().contains("curl"));
    assert_eq!(env.translator.calls(), 0);
}

#[tokio::test]
async fn test_crawler_with_non_utf8_user_agent_is_forbidden() {
    let env = TestEnvironment::without_cache();
    let app = router(env.pipeline.clone());

    let request = Request::builder()
        .uri(translate_uri(&["hello"], "es", "valid"))
        .header(header::USER_AGENT, HeaderValue::from_bytes(b"curl/8.0 \xff").unwrap())
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(env.translator.calls(), 0);
}

#[tokio::test]
async fn test_request_without_user_agent_is_allowed() {
    let app = router(TestEnvironment::without_cache().pipeline);

    let response = get(&app, &translate_uri(&["hello"], "es", "valid"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upstream_status_is_passed_through() {
    let pipeline = RequestPipeline::new(validator(), Arc::new(FailingTranslator { status: 503 }));
    let app = router(pipeline);

    let response = get(&app, &translate_uri(&["hello"], "es", "valid"), Some(BROWSER_UA)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["error"], "translation failed");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_cors_headers_are_present() {
    let app = router(TestEnvironment::without_cache().pipeline);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let app = router(TestEnvironment::without_cache().pipeline);

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/translate")
                .header(header::ORIGIN, "https://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
