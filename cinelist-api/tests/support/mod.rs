//! Shared setup for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use cinelist_api::{
    create_api_router, ApiConfig, AppState, AuthConfig, CatalogProbe, ItemsConfig,
    MemoryAuditSink, SecurityEvent, SecurityLogger,
};
use cinelist_storage::{sample_catalog, InMemoryCatalog};
use cinelist_test_utils::with_sessions;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

pub const API_KEY: &str = "cinelist_test_key_0001";
pub const SESSION_TOKEN: &str = "session-token-valid";
pub const EXPIRED_TOKEN: &str = "session-token-expired";
pub const SESSION_EMAIL: &str = "viewer@example.com";

pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<InMemoryCatalog>,
    pub audit: Arc<MemoryAuditSink>,
    pub auth_config: AuthConfig,
}

pub fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.add_api_key(API_KEY.to_string());
    config
}

pub fn test_app() -> TestApp {
    let catalog = Arc::new(sample_catalog().expect("sample catalog"));
    with_sessions(&catalog, SESSION_EMAIL, SESSION_TOKEN, EXPIRED_TOKEN).expect("sessions");

    let audit = Arc::new(MemoryAuditSink::new());
    let state = AppState::new(
        &ItemsConfig::instant(),
        catalog.clone(),
        CatalogProbe::Memory,
        SecurityLogger::new(audit.clone()),
    );
    let auth_config = test_auth_config();
    let router = create_api_router(
        state,
        &ApiConfig::default(),
        auth_config.clone(),
        catalog.clone(),
    )
    .expect("router");

    TestApp {
        router,
        catalog,
        audit,
        auth_config,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Raw text body, for non-JSON endpoints.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn get_as<T: DeserializeOwned>(&self, request: Request<Body>) -> T {
        let (status, json) = self.send(request).await;
        assert!(status.is_success(), "unexpected {}: {}", status, json);
        serde_json::from_value(json).expect("response shape")
    }

    pub fn audit_events(&self) -> Vec<SecurityEvent> {
        self.audit.events()
    }
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_api_key(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}
