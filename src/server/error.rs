// Gateway error responses
//
// Client input problems are 400s raised before any upstream call, 413 when
// the upload is over the size limit. Upstream
// failures become a generic 500 with the upstream status/body in `details`.
// A failed liveness probe is a degraded 503, never a crash.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upload over the configured size limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The analysis service failed or answered with an error (500)
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: BackendError,
    },

    /// Liveness probe failed (503)
    #[error("Python backend is not available: {0}")]
    Unavailable(#[source] BackendError),
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        GatewayError::BadRequest(message.into())
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        GatewayError::PayloadTooLarge(message.into())
    }

    pub fn upstream(message: &'static str, source: BackendError) -> Self {
        GatewayError::Upstream { message, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            GatewayError::BadRequest(message) | GatewayError::PayloadTooLarge(message) => {
                json!({ "error": message })
            }
            GatewayError::Upstream { message, source } => json!({
                "error": message,
                "details": source.to_string(),
            }),
            GatewayError::Unavailable(_) => json!({
                "status": "error",
                "error": "Python backend is not available",
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway handlers
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::bad_request("No file provided").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::too_large("Deck is too large").status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let upstream = GatewayError::upstream(
            "Failed to analyze slide",
            BackendError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(upstream.to_string().contains("boom"));

        let unavailable = GatewayError::Unavailable(BackendError::Decode("x".to_string()));
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
