//! Shared helpers for HTTP integration tests.
//!
//! Each test builds the production router over a fresh, seeded
//! [`InMemoryStore`] and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use competency_api::auth::jwt::{generate_access_token, JwtConfig};
use competency_api::config::{ServerConfig, StoreBackend};
use competency_api::router::build_app_router;
use competency_api::state::AppState;
use competency_core::types::DbId;
use competency_engine::{CompetencyEngine, EngineConfig, InMemoryStore};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        jwt: JwtConfig {
            secret: "competency-api-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// A router plus handles on the seeded reference data.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub communication: DbId,
    pub delegation: DbId,
    pub planning: DbId,
    pub manager: DbId,
    pub analyst: DbId,
}

/// Build the full application router over a seeded in-memory store.
pub async fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let communication = store.add_competency("Communication", Some("Leadership")).await.id;
    let delegation = store.add_competency("Delegation", Some("Leadership")).await.id;
    let planning = store.add_competency("Planning", Some("Execution")).await.id;
    let manager = store.add_position("Engineering Manager", Some("Engineering")).await.id;
    let analyst = store.add_position("Data Analyst", Some("Finance")).await.id;

    let state = AppState {
        engine: CompetencyEngine::new(store.clone(), EngineConfig::default()),
        config: Arc::new(test_config()),
    };

    TestApp {
        router: build_app_router(state),
        store,
        communication,
        delegation,
        planning,
        manager,
        analyst,
    }
}

/// A valid bearer token for `user_id`.
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, "manager", &test_config().jwt)
        .expect("token generation should succeed")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router is infallible")
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}
