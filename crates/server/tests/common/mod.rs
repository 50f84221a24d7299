//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router with a
//! `MockRenderer` injected, so no openscad binary is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use scadsrv_core::{testing::MockRenderer, Renderer};
use scadsrv_server::{create_router, AppState};

/// Test fixture for API testing with a mock renderer.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_export() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/openscad/v1/export", json!({
///         "scad_content": "cube(1);",
///         "format": "png"
///     })).await;
///
///     assert_status!(response, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock renderer - configure artifacts, summaries and failures
    pub renderer: Arc<MockRenderer>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw body bytes
    pub bytes: Vec<u8>,
    /// Body parsed as JSON, `Null` when it is not JSON
    pub body: Value,
}

impl TestResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with a default mock renderer.
    pub fn new() -> Self {
        Self::with_renderer(Arc::new(MockRenderer::new()))
    }

    /// Create a test fixture around the given mock.
    pub fn with_renderer(renderer: Arc<MockRenderer>) -> Self {
        let state = Arc::new(AppState::new(Arc::clone(&renderer) as Arc<dyn Renderer>));
        let router = create_router(state);

        Self { router, renderer }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &serde_json::to_string(&body).unwrap())
            .await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.post_with_content_type(path, body, "application/json")
            .await
    }

    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
