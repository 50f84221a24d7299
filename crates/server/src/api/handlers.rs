use axum::{http::header, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::metrics::encode_metrics;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build metadata, injected at compile time.
pub const COMMIT: &str = match option_env!("SCADSRV_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};
pub const TAG: &str = match option_env!("SCADSRV_TAG") {
    Some(tag) => tag,
    None => "unknown",
};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub commit: String,
    pub tag: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        commit: COMMIT.to_string(),
        tag: TAG.to_string(),
    })
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
