//! Error types for the API client.

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the API client.
///
/// Every variant renders as a message that can be shown to the user as-is.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend could not be reached at all (DNS, refused, offline).
    #[error("Cannot connect to API at {base_url}. Is the backend running?")]
    Connect { base_url: String },

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The mission deadline elapsed before the consensus pipeline answered.
    #[error("Mission Mode timeout after {0}s. Consensus pipeline may be taking longer than expected. Try again or use Fast mode.")]
    Timeout(u64),

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// A configured URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
