use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

/// Relay error type
///
/// Covers every failure the producer path, the consumer worker and the
/// resource resolver can report.
#[derive(Error, Debug)]
pub enum RelayError {
    // ===== Resource Resolution =====
    #[error("Binding error: {0}")]
    Binding(String),

    // ===== Broker =====
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    // ===== Task Execution =====
    #[error("Capacity error: {0}")]
    Capacity(String),

    // ===== Configuration =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
            RelayError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            RelayError::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Binding(_) | RelayError::Config(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Binding(_) => "Messaging resource unavailable".to_string(),
            RelayError::Transport(_) => "Message broker unavailable".to_string(),
            RelayError::MalformedMessage(msg) => format!("Malformed message: {}", msg),
            RelayError::Capacity(_) => "Relay is busy".to_string(),
            RelayError::Config(msg) => format!("Configuration error: {}", msg),
            RelayError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Binding(_) => "BINDING_ERROR",
            RelayError::Transport(_) => "TRANSPORT_ERROR",
            RelayError::MalformedMessage(_) => "MALFORMED_MESSAGE",
            RelayError::Capacity(_) => "CAPACITY_ERROR",
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();

        // Server errors never expose broker or resolver details
        let body = json!({
            "error": self.user_message(),
            "error_code": error_code,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

// ============================================================================
// Conversion from common error types
// ============================================================================

impl From<redis::RedisError> for RelayError {
    fn from(err: redis::RedisError) -> Self {
        RelayError::Transport(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for RelayError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        RelayError::MalformedMessage(format!("undecodable frame: {}", err))
    }
}

impl From<rmp_serde::encode::Error> for RelayError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        RelayError::Internal(format!("frame encoding failed: {}", err))
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl RelayError {
    /// Create a binding error
    pub fn binding(msg: impl Into<String>) -> Self {
        RelayError::Binding(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        RelayError::Transport(msg.into())
    }

    /// Create a malformed message error
    pub fn malformed(msg: impl Into<String>) -> Self {
        RelayError::MalformedMessage(msg.into())
    }

    /// Create a capacity error
    pub fn capacity(msg: impl Into<String>) -> Self {
        RelayError::Capacity(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        RelayError::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        RelayError::Internal(msg.into())
    }
}
