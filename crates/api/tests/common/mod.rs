#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use layerforge_api::auth::jwt::{generate_access_token, JwtConfig};
use layerforge_api::config::ServerConfig;
use layerforge_api::router::build_app_router;
use layerforge_api::state::AppState;
use layerforge_core::types::DbId;
use layerforge_gateway::{ChatMessage, CompletionProvider, GatewayError};
use layerforge_pipeline::DemoConfig;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig`: no database, no gateway, zero demo delays
/// and a fresh upload directory under the system temp dir.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        upload_dir: std::env::temp_dir().join(format!("layerforge-test-{}", uuid::Uuid::new_v4())),
        public_base_url: "http://localhost:3000".to_string(),
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        gateway: None,
        demo: DemoConfig::immediate(),
    }
}

/// In-memory application state, optionally with a completion provider.
pub fn test_state(provider: Option<Arc<dyn CompletionProvider>>) -> AppState {
    AppState::in_memory(test_config(), provider)
}

/// Build the full application router, the same one `main.rs` serves.
pub fn build_test_app(state: AppState) -> Router {
    build_app_router(state)
}

/// Signed bearer token for `user_id`.
pub fn bearer_token(user_id: DbId) -> String {
    let config = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    format!("Bearer {}", generate_access_token(user_id, &config).unwrap())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// `post_json` with an `Authorization` header.
pub async fn post_json_as(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    authorization: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", authorization)
        .body(Body::from(serde_json::to_vec(&json).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Answers every request with canned text, optionally failing the n-th
/// call (1-based) with a 500.
pub struct ScriptedProvider {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl ScriptedProvider {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
        })
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(call),
        })
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(GatewayError::Api {
                status: 500,
                body: "upstream exploded".into(),
            });
        }
        Ok(format!("answer {n}"))
    }
}
