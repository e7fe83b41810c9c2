//! Error types for the generation subsystem.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures produced while generating text.
///
/// User-correctable problems (a bad or missing key, empty input) are kept
/// apart from transient remote failures so callers can word them differently.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The remote service rejected the API key.
    #[error("invalid API key: {0}")]
    InvalidKey(String),
    /// No API key was supplied.
    #[error("no API key provided")]
    MissingKey,
    /// A required input was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyInput {
        /// Name of the rejected input.
        field: &'static str,
    },
    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The key is known but the call was refused (quota, permission).
    #[error("quota or authorization failure: {0}")]
    QuotaOrAuth(String),
    /// Anything else, with the underlying message.
    #[error("{0}")]
    Unknown(String),
}

/// Stable, serializable classification of a [`GenerationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`GenerationError::InvalidKey`].
    InvalidKey,
    /// See [`GenerationError::MissingKey`].
    MissingKey,
    /// See [`GenerationError::EmptyInput`].
    EmptyInput,
    /// See [`GenerationError::Network`].
    Network,
    /// See [`GenerationError::QuotaOrAuth`].
    QuotaOrAuth,
    /// See [`GenerationError::Unknown`].
    Unknown,
}

impl ErrorKind {
    /// Machine-readable code used in HTTP error envelopes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidKey => "INVALID_KEY",
            Self::MissingKey => "MISSING_KEY",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::Network => "NETWORK_FAILURE",
            Self::QuotaOrAuth => "QUOTA_OR_AUTH_FAILURE",
            Self::Unknown => "UNKNOWN_FAILURE",
        }
    }
}

impl GenerationError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKey(_) => ErrorKind::InvalidKey,
            Self::MissingKey => ErrorKind::MissingKey,
            Self::EmptyInput { .. } => ErrorKind::EmptyInput,
            Self::Network(_) => ErrorKind::Network,
            Self::QuotaOrAuth(_) => ErrorKind::QuotaOrAuth,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether the user can fix this by changing their input or key.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey(_) | Self::MissingKey | Self::EmptyInput { .. }
        )
    }

    /// Whether retrying the same call by hand later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::QuotaOrAuth(_))
    }

    /// Classify a non-success HTTP response from the Gemini API.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
        match status {
            StatusCode::BAD_REQUEST if body.contains("API key not valid") => {
                Self::InvalidKey(message)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Self::QuotaOrAuth(message)
            }
            _ => Self::Unknown(message),
        }
    }

    /// A successful call that carried no usable text (blocked prompt, token
    /// budget spent before any output, empty parts).
    #[must_use]
    pub fn empty_response(detail: impl std::fmt::Display) -> Self {
        Self::Unknown(format!("empty response: {detail}"))
    }

    /// Classify an opaque error message from a client library.
    ///
    /// Used where only the rendered error is available; the message is kept
    /// intact inside the chosen variant.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_ascii_lowercase();

        if lowered.contains("api key not valid") || lowered.contains("api_key_invalid") {
            Self::InvalidKey(message)
        } else if ["429", "401", "403", "quota", "resource_exhausted", "permission_denied"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            Self::QuotaOrAuth(message)
        } else if ["error sending request", "connection", "timed out", "dns error"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            Self::Network(message)
        } else {
            Self::Unknown(message)
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status, &err.to_string());
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Network(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// Convenience result alias for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = GenerationError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"API key not valid. Please pass a valid API key."}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert!(err.is_user_correctable());

        let err = GenerationError::from_status(StatusCode::TOO_MANY_REQUESTS, "quota exceeded");
        assert_eq!(err.kind(), ErrorKind::QuotaOrAuth);
        assert!(err.is_transient());
        assert!(err.to_string().contains("quota exceeded"));

        let err = GenerationError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_message_classification() {
        let err = GenerationError::from_message("ProviderError: 429 RESOURCE_EXHAUSTED");
        assert_eq!(err.kind(), ErrorKind::QuotaOrAuth);
        assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));

        let err = GenerationError::from_message("API key not valid. Please pass a valid API key.");
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        let err = GenerationError::from_message("error sending request for url");
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = GenerationError::from_message("unexpected response shape");
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_empty_response_is_unknown() {
        let err = GenerationError::empty_response("finish reason MAX_TOKENS");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_user_correctable());
        assert_eq!(err.to_string(), "empty response: finish reason MAX_TOKENS");
    }

    #[test]
    fn test_empty_input_message() {
        let err = GenerationError::EmptyInput { field: "question" };
        assert_eq!(err.to_string(), "question must not be empty");
        assert_eq!(err.kind().code(), "EMPTY_INPUT");
    }
}
