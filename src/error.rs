//! Verification error types.

use thiserror::Error;

/// Failure while verifying credentials against the remote endpoint.
///
/// Every variant means "not authenticated". The gateway logs the error and
/// denies the connection; callers of the hook layer never see it.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Network failure or timeout contacting the endpoint.
    #[error("verification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Endpoint answered with a non-2xx status.
    #[error("verification endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response body did not decode into a complete identity.
    #[error("malformed verification response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl VerifyError {
    /// Endpoint could not be reached or did not answer in time.
    pub fn is_transport(&self) -> bool {
        matches!(self, VerifyError::Transport(_))
    }

    /// Endpoint answered, but not with an acceptable identity.
    pub fn is_protocol(&self) -> bool {
        matches!(self, VerifyError::Status { .. } | VerifyError::Malformed(_))
    }

    /// Request hit the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, VerifyError::Transport(e) if e.is_timeout())
    }
}
