//! Completion messages posted by the sign-in popup.
//!
//! ```text
//! {"type": "GOOGLE_AUTH_SUCCESS", "token": "...", "user": {...}}
//! {"type": "GOOGLE_AUTH_ERROR", "error": "..."}
//! ```

use crate::protocol::models::UserProfile;
use serde::Deserialize;
use serde_json::Value;

/// `type` of a successful completion.
pub const SUCCESS_TYPE: &str = "GOOGLE_AUTH_SUCCESS";

/// `type` of a failed completion.
pub const ERROR_TYPE: &str = "GOOGLE_AUTH_ERROR";

/// Failure text when the provider sent no reason.
pub const DEFAULT_ERROR: &str = "Google sign-in failed";

/// Failure text for a success message that cannot be used.
pub const MALFORMED_SUCCESS: &str = "Google sign-in returned an incomplete response";

/// A message from an allowed origin, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionMessage {
    /// Usable session.
    Success {
        /// Bearer token for the new session.
        token: String,
        /// The signed-in account.
        user: UserProfile,
    },
    /// Terminal failure, including malformed success payloads.
    Error {
        /// User-facing failure text.
        message: String,
    },
    /// Not a handshake message; the listener keeps waiting.
    Unrecognized,
}

#[derive(Deserialize)]
struct SuccessPayload {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

impl CompletionMessage {
    /// Classify a posted message. Never fails: bad success payloads take
    /// the error path.
    pub fn classify(data: &Value) -> Self {
        match data.get("type").and_then(Value::as_str) {
            Some(SUCCESS_TYPE) => match SuccessPayload::deserialize(data) {
                Ok(SuccessPayload { token, user }) if !token.is_empty() => {
                    CompletionMessage::Success { token, user }
                }
                _ => CompletionMessage::Error {
                    message: MALFORMED_SUCCESS.to_string(),
                },
            },
            Some(ERROR_TYPE) => {
                let message = ErrorPayload::deserialize(data)
                    .ok()
                    .and_then(|p| p.error)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_ERROR.to_string());
                CompletionMessage::Error { message }
            }
            _ => CompletionMessage::Unrecognized,
        }
    }
}
