//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, test_state, ScriptedProvider};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_reports_memory_store() {
    let app = common::build_test_app(test_state(None));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_backend"], "memory");
    assert_eq!(json["store_healthy"], true);
    assert_eq!(json["gateway_configured"], false);
}

#[tokio::test]
async fn health_check_reports_configured_gateway() {
    let app = common::build_test_app(test_state(Some(ScriptedProvider::ok())));
    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["gateway_configured"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(test_state(None));
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(test_state(None));
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let app = common::build_test_app(test_state(None));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/asset-packs")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    let methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn empty_listings_on_fresh_state() {
    let app = common::build_test_app(test_state(None));

    let packs = body_json(get(app.clone(), "/api/v1/asset-packs").await).await;
    assert_eq!(packs["data"], serde_json::json!([]));

    let jobs = body_json(get(app, "/api/v1/pipeline-jobs").await).await;
    assert_eq!(jobs["data"], serde_json::json!([]));
}

#[tokio::test]
async fn maximal_offset_returns_an_empty_page() {
    let app = common::build_test_app(test_state(None));

    for uri in [
        "/api/v1/asset-packs?offset=9223372036854775807",
        "/api/v1/pipeline-jobs?offset=9223372036854775807&limit=9223372036854775807",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_json(response).await["data"], serde_json::json!([]));
    }
}
