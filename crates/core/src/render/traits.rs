//! Trait definitions for the render module.

use async_trait::async_trait;

use super::error::RenderError;
use super::types::{ExportArtifact, ExportRequest, SummaryRequest, SummaryResponse};

/// A renderer that turns OpenSCAD scripts into artifacts or summaries.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Renders the script in the requested format.
    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, RenderError>;

    /// Runs the script in diagnostic mode and returns the parsed summary.
    async fn summary(&self, request: &SummaryRequest) -> Result<SummaryResponse, RenderError>;

    /// Validates that the renderer is properly configured and ready.
    async fn validate(&self) -> Result<(), RenderError>;
}
