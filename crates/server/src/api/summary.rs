//! Summary API handler.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use scadsrv_core::{SummaryRequest, SummaryResponse};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Run the script in summary mode and return the parsed report.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::InvalidRequest)?;

    let response = state
        .renderer()
        .summary(&request)
        .await
        .map_err(ApiError::Summary)?;

    Ok(Json(response))
}
