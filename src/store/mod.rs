//! Credential store: durable bearer token and user profile.
//!
//! The store holds exactly two entries, [`TOKEN_KEY`] and [`USER_KEY`].
//! They are written together and removed together; a lone entry found on
//! load counts as "no session".

pub mod file;
pub mod memory;

use crate::protocol::models::UserProfile;
use crate::SessionError;

/// Key of the bearer token entry.
pub const TOKEN_KEY: &str = "ss_auth_token";

/// Key of the serialized user profile entry.
pub const USER_KEY: &str = "ss_user";

/// A persisted session: bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredentials {
    /// Opaque bearer token.
    pub token: String,
    /// User profile as last returned by the authority.
    pub user: UserProfile,
}

/// Durable key/value persistence for the session credentials.
pub trait CredentialStore: Send + Sync {
    /// Load the persisted pair, if both entries exist.
    fn load(&self) -> Result<Option<StoredCredentials>, SessionError>;

    /// Persist both entries.
    fn save(&self, credentials: &StoredCredentials) -> Result<(), SessionError>;

    /// Remove both entries. Removing missing entries is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Serialize a user profile for the [`USER_KEY`] entry.
pub fn encode_user(user: &UserProfile) -> Result<String, SessionError> {
    serde_json::to_string(user)
        .map_err(|e| SessionError::StoreIO(format!("Failed to serialize user: {}", e)))
}

/// Decode the [`USER_KEY`] entry.
pub fn decode_user(raw: &str) -> Result<UserProfile, SessionError> {
    serde_json::from_str(raw)
        .map_err(|e| SessionError::StoreCorrupt(format!("Failed to parse user: {}", e)))
}

/// Short SHA-256 fingerprint of a bearer token for log lines.
///
/// The token itself is never logged.
pub fn token_fingerprint(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(token.as_bytes());
    hex::encode(&hash[..6])
}

/// Combine raw entries into credentials.
///
/// Returns `Ok(None)` unless both entries are present and the token is
/// non-empty.
pub fn assemble(
    token: Option<String>,
    user: Option<String>,
) -> Result<Option<StoredCredentials>, SessionError> {
    match (token.filter(|t| !t.is_empty()), user) {
        (Some(token), Some(user)) => Ok(Some(StoredCredentials {
            token,
            user: decode_user(&user)?,
        })),
        _ => Ok(None),
    }
}
