//! Error responses for the API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scadsrv_core::RenderError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Failures surfaced by the export and summary handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Body could not be parsed or is missing required fields.
    InvalidRequest(String),
    /// Export failed in the renderer.
    Export(RenderError),
    /// Summary failed in the renderer.
    Summary(RenderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Export(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Export(_) | Self::Summary(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid request",
            Self::Export(_) => "export failed",
            Self::Summary(_) => "summary generation failed",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::InvalidRequest(message) => message.clone(),
            Self::Export(e) | Self::Summary(e) => {
                error!("OpenSCAD {}: {}", self.label(), e);
                e.to_string()
            }
        };

        let body = ErrorResponse {
            error: self.label().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidRequest("missing field".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Export(RenderError::InvalidFormat {
                format: "gif".into()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Export(RenderError::DeadlineExceeded {
                timeout: std::time::Duration::from_secs(300),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Summary(RenderError::Parse {
                reason: "eof".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_omits_empty_message() {
        let body = ErrorResponse {
            error: "invalid request".into(),
            message: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "invalid request"})
        );
    }
}
