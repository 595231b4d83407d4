//! Error envelope (§6): `{error:{code, message, details?, timestamp}}`,
//! with `Error::kind()` mapped to an HTTP status per §7's table.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domainflow_core::ErrorKind;
use serde::Serialize;

/// Wraps `domainflow_core::Error` so this crate can own the `IntoResponse`
/// impl — orphan rules forbid implementing it on the foreign type
/// directly from here.
pub struct ApiError(pub domainflow_core::Error);

impl From<domainflow_core::Error> for ApiError {
    fn from(err: domainflow_core::Error) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn code_and_status(kind: ErrorKind) -> (&'static str, StatusCode) {
    match kind {
        ErrorKind::Validation => ("validation", StatusCode::BAD_REQUEST),
        ErrorKind::NotFound => ("not_found", StatusCode::NOT_FOUND),
        ErrorKind::Conflict => ("conflict", StatusCode::CONFLICT),
        ErrorKind::PermissionDenied => ("permission_denied", StatusCode::FORBIDDEN),
        ErrorKind::Transient => ("transient", StatusCode::SERVICE_UNAVAILABLE),
        ErrorKind::ResourceExhausted => ("resource_exhausted", StatusCode::SERVICE_UNAVAILABLE),
        ErrorKind::DeadlineExceeded => ("deadline_exceeded", StatusCode::GATEWAY_TIMEOUT),
        ErrorKind::Cancelled => ("cancelled", StatusCode::SERVICE_UNAVAILABLE),
        ErrorKind::Internal => ("internal", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let (code, status) = code_and_status(kind);
        if status.is_server_error() {
            tracing::error!(error = %self.0, %code, "request failed");
        } else {
            tracing::warn!(error = %self.0, %code, "request rejected");
        }

        let body = ErrorBody {
            code,
            message: self.0.to_string(),
            details: None,
            timestamp: chrono::Utc::now(),
        };
        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}
