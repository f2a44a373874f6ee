//! Auth-specific error types.

use thiserror::Error;

/// Errors that can occur in the authentication domain.
///
/// The enum is `Clone` because mint failures are fanned out to every caller
/// waiting on the same in-flight mint attempt.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The signing identity is missing or the private key cannot be parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The cryptographic signing operation failed.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// The callback presented a state parameter that is unknown or expired.
    #[error("Invalid or expired state parameter")]
    InvalidState,

    /// A required handshake parameter was absent.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Token exchange was attempted with a grant type other than
    /// `authorization_code`.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Token exchange presented a code that is unknown or expired.
    #[error("Unknown or expired authorization code")]
    UnknownCode,

    /// A user-scoped operation was attempted without a Music User Token.
    #[error("No Music User Token available for this request")]
    MissingUserToken,
}

impl AuthError {
    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error is caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState
                | Self::MissingParameter(_)
                | Self::UnsupportedGrantType(_)
                | Self::UnknownCode
                | Self::MissingUserToken
        )
    }
}
