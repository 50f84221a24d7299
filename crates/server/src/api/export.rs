//! Export API handler.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use scadsrv_core::ExportRequest;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

/// Render the script and return the raw artifact bytes.
pub async fn export(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::InvalidRequest)?;

    let artifact = state
        .renderer()
        .export(&request)
        .await
        .map_err(ApiError::Export)?;

    info!(
        "Exported {} ({} bytes, {})",
        request.format,
        artifact.data.len(),
        artifact.content_type
    );

    Ok(([(header::CONTENT_TYPE, artifact.content_type)], artifact.data).into_response())
}
