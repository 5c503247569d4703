//! Error types for the HTTP adapter

use empathy_application::ApiError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while building the HTTP client
#[derive(Error, Debug)]
pub enum HttpSetupError {
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Map a non-success response onto the port's error taxonomy.
///
/// The server's `detail` text is kept as the error body.
pub fn classify_status(status: StatusCode, body: String) -> ApiError {
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { status: code, body },
        StatusCode::NOT_FOUND => ApiError::NotFound(body),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation { status: code, body }
        }
        _ => ApiError::UnexpectedStatus { status: code, body },
    }
}

/// Map a transport-level failure (connect, timeout, broken body).
pub fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Network(format!("request timed out: {}", error))
    } else {
        ApiError::Network(error.to_string())
    }
}
