//! Music API client error types.

use thiserror::Error;

use crate::domains::auth::AuthError;

/// Errors raised while talking to the Apple Music API.
#[derive(Debug, Error)]
pub enum MusicError {
    /// A user-scoped endpoint was called without a resolved user token.
    #[error("No Music User Token available: this tool requires user authorization")]
    MissingUserToken,

    /// The API returned a non-success status.
    #[error("Apple Music API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request could not be sent or the response body read.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Obtaining the developer token failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl MusicError {
    /// Create an upstream error from a status code and body text.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }
}
