//! Transport-level error types.

use thiserror::Error;

use crate::application::ports::BackendError;

/// Errors from the HTTP transport, before mapping onto the port error.
#[derive(Debug, Error, Clone)]
pub enum BackendApiError {
    /// Request could not be built or sent.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Final attempt answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Status code of the reply.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// Network error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// Reply body could not be parsed as JSON.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Status of the last reply, when one arrived at all.
        last_status: Option<u16>,
    },
}

impl From<BackendApiError> for BackendError {
    fn from(err: BackendApiError) -> Self {
        match err {
            BackendApiError::Status { status, message } => Self::Http { status, message },
            BackendApiError::Http(message) | BackendApiError::Network(message) => {
                Self::Network { message }
            }
            BackendApiError::JsonParse(message) => Self::Decode { message },
            BackendApiError::MaxRetriesExceeded {
                attempts,
                last_status: Some(status),
            } => Self::Http {
                status,
                message: format!("gave up after {attempts} attempts"),
            },
            BackendApiError::MaxRetriesExceeded {
                attempts,
                last_status: None,
            } => Self::Network {
                message: format!("gave up after {attempts} attempts"),
            },
        }
    }
}
