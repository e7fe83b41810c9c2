//! HTTP error envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::generation::{ErrorKind, GenerationError, Task};

/// Shown when a generation is attempted without a key.
pub const MISSING_KEY_MESSAGE: &str = "Please enter your Gemini API Key in the sidebar.";

/// Handler error rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Input validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: ErrorKind::EmptyInput.code(),
            message: message.into(),
        }
    }

    /// No API key in the session.
    #[must_use]
    pub fn missing_key() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: ErrorKind::MissingKey.code(),
            message: MISSING_KEY_MESSAGE.to_string(),
        }
    }

    /// A generation for `task` failed.
    #[must_use]
    pub fn generation(task: Task, err: &GenerationError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::EmptyInput | ErrorKind::MissingKey => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidKey => StatusCode::UNAUTHORIZED,
            ErrorKind::QuotaOrAuth => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: kind.code(),
            message: format!("Error generating {}: {err}", task.noun()),
        }
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}
