//! Mock renderer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::render::{
    validate_format, ExportArtifact, ExportRequest, RenderError, Renderer, SummaryRequest,
    SummaryResponse,
};

/// A request seen by the mock, for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedRequest {
    Export(ExportRequest),
    Summary(SummaryRequest),
}

/// Mock implementation of the Renderer trait.
///
/// Provides controllable behavior for testing:
/// - Track requests for assertions
/// - Simulate failures with any [`RenderError`]
/// - Control the returned artifact bytes and summary
///
/// Format validation matches the real renderer, so unsupported formats are
/// rejected before anything is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use scadsrv_core::testing::MockRenderer;
///
/// let renderer = MockRenderer::new();
/// renderer.set_artifact_data(b"fake png".to_vec()).await;
///
/// let artifact = renderer.export(&ExportRequest::new("cube(1);", "png")).await?;
/// assert_eq!(renderer.export_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockRenderer {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<RenderError>>>,
    /// Bytes returned by every successful export.
    artifact_data: Arc<RwLock<Vec<u8>>>,
    /// Summary returned by every successful summary.
    summary: Arc<RwLock<serde_json::Map<String, serde_json::Value>>>,
    /// Whether validate() succeeds.
    healthy: Arc<RwLock<bool>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    /// Create a new mock renderer.
    pub fn new() -> Self {
        let mut summary = serde_json::Map::new();
        summary.insert(
            "geometry".to_string(),
            serde_json::json!({"dimensions": 3, "convex": true}),
        );

        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            artifact_data: Arc::new(RwLock::new(b"mock artifact".to_vec())),
            summary: Arc::new(RwLock::new(summary)),
            healthy: Arc::new(RwLock::new(true)),
        }
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Get the recorded export requests.
    pub async fn recorded_exports(&self) -> Vec<ExportRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Export(req) => Some(req.clone()),
                RecordedRequest::Summary(_) => None,
            })
            .collect()
    }

    /// Get the number of exports performed.
    pub async fn export_count(&self) -> usize {
        self.recorded_exports().await.len()
    }

    /// Get the number of summaries performed.
    pub async fn summary_count(&self) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| matches!(r, RecordedRequest::Summary(_)))
            .count()
    }

    /// Clear recorded requests.
    pub async fn clear_recorded(&self) {
        self.requests.write().await.clear();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: RenderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the bytes returned by exports.
    pub async fn set_artifact_data(&self, data: Vec<u8>) {
        *self.artifact_data.write().await = data;
    }

    /// Set the summary returned by summaries.
    pub async fn set_summary(&self, summary: serde_json::Map<String, serde_json::Value>) {
        *self.summary.write().await = summary;
    }

    /// Make validate() fail or succeed.
    pub async fn set_healthy(&self, healthy: bool) {
        *self.healthy.write().await = healthy;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<RenderError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, RenderError> {
        let format = validate_format(&request.format)?;

        self.requests
            .write()
            .await
            .push(RecordedRequest::Export(request.clone()));

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        Ok(ExportArtifact {
            data: self.artifact_data.read().await.clone(),
            content_type: format.content_type(),
        })
    }

    async fn summary(&self, request: &SummaryRequest) -> Result<SummaryResponse, RenderError> {
        self.requests
            .write()
            .await
            .push(RecordedRequest::Summary(request.clone()));

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        Ok(SummaryResponse {
            summary: self.summary.read().await.clone(),
        })
    }

    async fn validate(&self) -> Result<(), RenderError> {
        if *self.healthy.read().await {
            Ok(())
        } else {
            Err(RenderError::process_failed(
                "failed to start openscad: not found",
                "",
            ))
        }
    }
}
