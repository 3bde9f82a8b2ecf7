//! Error types for the Libris client

use thiserror::Error;

/// Fallback message when neither the server body nor the transport
/// provides anything usable.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Server answered with a status >= 400. `message` is already
    /// normalized (detail/message/error field, then status reason).
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Client-side validation failed before any network call.
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn decode(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }

    /// HTTP status for server-reported errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The user-facing message slices store in their `error` field.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
