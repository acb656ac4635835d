//! Error types for the Cadence server client.

use thiserror::Error;

/// Errors that can occur when talking to the Cadence API.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Endpoint requires a token and none (or an expired one) was sent
    #[error("Authentication required")]
    AuthRequired,

    /// Song or playlist does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Song carries neither an audio file nor an embeddable video
    #[error("Song {0} has no playable source")]
    NoPlayableSource(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Rate limited by server
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;

impl ServerClientError {
    /// Map a transport error, separating "server not there" from the rest
    pub(crate) fn from_send(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ServerUnreachable(error.to_string())
        } else {
            Self::Request(error)
        }
    }

    /// Build the error for a non-success response
    pub(crate) async fn from_response(response: reqwest::Response, what: &str) -> Self {
        let status = response.status().as_u16();
        match status {
            401 | 403 => Self::AuthRequired,
            404 => Self::NotFound(what.to_string()),
            429 => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Self::RateLimited { retry_after_secs }
            }
            _ => Self::ServerError {
                status,
                message: response.text().await.unwrap_or_default(),
            },
        }
    }
}
