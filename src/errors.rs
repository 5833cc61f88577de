//! Sessionward error types.

use thiserror::Error;

/// Errors that can occur while talking to the remote authority or the
/// credential store.
///
/// Session manager operations translate these into structured outcomes;
/// they only escape as `Err` from [`crate::SessionManager::reconcile`] and
/// from construction.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or transport failure reaching the remote authority.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote call did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The remote authority rejected the bearer credential (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized {
        /// Error message from the response body, if any.
        message: Option<String>,
    },

    /// The remote authority refused the action (HTTP 403, quota exceeded).
    #[error("Forbidden")]
    Forbidden {
        /// Error message from the response body, if any.
        message: Option<String>,
    },

    /// Any other non-success status.
    #[error("Request rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: Option<String>,
    },

    /// A response body did not match the expected schema.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Credential store I/O error.
    #[error("Credential store I/O error: {0}")]
    StoreIO(String),

    /// A persisted credential entry could not be decoded.
    #[error("Credential store entry is corrupt: {0}")]
    StoreCorrupt(String),
}

impl SessionError {
    /// Whether this is an unauthorized response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Unauthorized { .. })
    }

    /// Whether this failure is transient: the session must not be treated as
    /// invalid because of it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(_)
                | SessionError::Timeout
                | SessionError::Rejected { .. }
                | SessionError::Protocol(_)
        )
    }

    /// Message to show the user, taken from the remote error payload when
    /// there is one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SessionError::Unauthorized { message: Some(m) }
            | SessionError::Forbidden { message: Some(m) }
            | SessionError::Rejected {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => fallback.to_string(),
        }
    }
}
