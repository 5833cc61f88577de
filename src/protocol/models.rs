//! Request and response schemas for the remote authority endpoints.
//!
//! Every endpoint gets an explicit schema. Shapes are validated on decode;
//! a body that does not match is a [`SessionError::Protocol`] error, which
//! callers treat as a transient failure.

use crate::SessionError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// User profile as defined by the remote authority.
///
/// Only `email`, `name` and `has_license` are read by this crate. Everything
/// else the authority sends is kept in `extra` so the persisted record
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Authority-assigned identifier (string or number).
    #[serde(default)]
    pub id: Value,

    /// Account email address.
    #[serde(default)]
    pub email: String,

    /// Display name, if the user gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the account holds a license.
    #[serde(default)]
    pub has_license: bool,

    /// Remaining authority-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Create a minimal profile.
    pub fn new(id: impl Into<Value>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            has_license: false,
            extra: Map::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the license flag.
    pub fn with_license(mut self, has_license: bool) -> Self {
        self.has_license = has_license;
        self
    }
}

/// `POST /api/auth/login` body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account email.
    pub email: &'a str,
    /// Plain-text password, sent over TLS only.
    pub password: &'a str,
}

/// `POST /api/auth/signup` body.
#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    /// Account email.
    pub email: &'a str,
    /// Chosen password.
    pub password: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Product origin tag.
    pub origin: &'a str,
}

/// `POST /api/downloads/track` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest<'a> {
    /// Label of the downloaded item.
    pub preset_name: &'a str,
}

/// Login response. A token signals success.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the new session.
    #[serde(default)]
    pub token: Option<String>,
    /// The signed-in account.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Signup response. The presence of `user` signals success; its shape is
/// not used because a successful signup is followed by a login.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    /// The created account, if any.
    #[serde(default)]
    pub user: Option<Value>,
}

impl SignupResponse {
    /// Whether the authority created the account.
    pub fn created(&self) -> bool {
        self.user.as_ref().is_some_and(|u| !u.is_null())
    }
}

/// `GET /api/license/check` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseCheckResponse {
    /// Whether the account holds a license.
    #[serde(default)]
    pub has_license: bool,
    /// Quota counters, when the authority sends them.
    #[serde(default)]
    pub downloads: Option<DownloadStats>,
}

/// Quota counters embedded in the license check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStats {
    /// Downloads used today.
    #[serde(default, deserialize_with = "lenient_count")]
    pub downloads_today: Option<u32>,
    /// Downloads left today.
    #[serde(default, deserialize_with = "lenient_count")]
    pub downloads_remaining: Option<u32>,
    /// Whether another download is allowed.
    #[serde(default)]
    pub can_download: Option<bool>,
}

/// `GET /api/downloads/check` response, handed back to callers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    /// Downloads used today.
    #[serde(default, deserialize_with = "lenient_count")]
    pub downloads_today: Option<u32>,
    /// Downloads left today.
    #[serde(default, deserialize_with = "lenient_count")]
    pub remaining: Option<u32>,
    /// Whether one more download may start.
    pub allowed: bool,
    /// Whether the account is licensed.
    #[serde(default)]
    pub is_premium: bool,
}

/// `POST /api/downloads/track` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackResponse {
    /// Whether the download was recorded.
    #[serde(default)]
    pub success: bool,
    /// Downloads left after this one.
    #[serde(default, deserialize_with = "lenient_count")]
    pub remaining: Option<u32>,
    /// Reason the download was not recorded.
    #[serde(default)]
    pub error: Option<String>,
}

/// Error payload carried by non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error text.
    #[serde(default)]
    pub error: Option<String>,
}

/// Decode a response body into its schema.
pub fn parse_body<T: DeserializeOwned>(body: &[u8], endpoint: &str) -> Result<T, SessionError> {
    serde_json::from_slice(body).map_err(|e| {
        SessionError::Protocol(format!("Unexpected {} response: {}", endpoint, e))
    })
}

/// Extract the `error` message from a failure body, if there is one.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

/// Counters arrive as numbers, numeric strings, or placeholders for
/// licensed accounts. Non-numeric values become `None`; negatives clamp to 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(raw.clamp(0, i64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let body = br#"{"token":"t1","user":{"id":7,"email":"a@x.com","hasLicense":false,"plan":"free"}}"#;
        let response: LoginResponse = parse_body(body, "login").unwrap();

        assert_eq!(response.token.as_deref(), Some("t1"));
        let user = response.user.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.id, Value::from(7));
        assert!(!user.has_license);
        assert_eq!(user.extra.get("plan"), Some(&Value::from("free")));
    }

    #[test]
    fn test_user_profile_roundtrip_keeps_extra_fields() {
        let json = r#"{"id":"u-1","email":"b@x.com","name":"Bee","hasLicense":true,"createdAt":"2025-01-01"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        let back: UserProfile =
            serde_json::from_str(&serde_json::to_string(&user).unwrap()).unwrap();

        assert_eq!(user, back);
        assert!(back.extra.contains_key("createdAt"));
        assert!(!back.extra.contains_key("hasLicense"));
    }

    #[test]
    fn test_signup_created() {
        let ok: SignupResponse = parse_body(br#"{"user":{"id":1}}"#, "signup").unwrap();
        let null: SignupResponse = parse_body(br#"{"user":null}"#, "signup").unwrap();
        let missing: SignupResponse = parse_body(br#"{}"#, "signup").unwrap();

        assert!(ok.created());
        assert!(!null.created());
        assert!(!missing.created());
    }

    #[test]
    fn test_license_check_with_placeholder_remaining() {
        let body = br#"{"hasLicense":true,"downloads":{"downloadsToday":1,"downloadsRemaining":"unlimited-irrelevant","canDownload":true}}"#;
        let response: LicenseCheckResponse = parse_body(body, "license check").unwrap();

        assert!(response.has_license);
        let downloads = response.downloads.unwrap();
        assert_eq!(downloads.downloads_today, Some(1));
        assert_eq!(downloads.downloads_remaining, None);
        assert_eq!(downloads.can_download, Some(true));
    }

    #[test]
    fn test_license_check_without_downloads() {
        let response: LicenseCheckResponse =
            parse_body(br#"{"hasLicense":false}"#, "license check").unwrap();
        assert!(!response.has_license);
        assert!(response.downloads.is_none());
    }

    #[test]
    fn test_negative_counts_clamp_to_zero() {
        let body = br#"{"downloadsToday":"3","remaining":-2,"allowed":false}"#;
        let response: EligibilityResponse = parse_body(body, "eligibility").unwrap();

        assert_eq!(response.downloads_today, Some(3));
        assert_eq!(response.remaining, Some(0));
        assert!(!response.is_premium);
    }

    #[test]
    fn test_eligibility_requires_allowed() {
        let result: Result<EligibilityResponse, _> =
            parse_body(br#"{"remaining":2}"#, "eligibility");
        assert!(matches!(result, Err(SessionError::Protocol(_))));
    }

    #[test]
    fn test_track_request_field_name() {
        let json = serde_json::to_value(TrackRequest { preset_name: "preset1" }).unwrap();
        assert_eq!(json, serde_json::json!({ "presetName": "preset1" }));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(br#"{"error":"Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        assert_eq!(error_message(br#"{"error":""}"#), None);
        assert_eq!(error_message(b"<html>502</html>"), None);
    }

    #[test]
    fn test_parse_malformed_json() {
        let result: Result<TrackResponse, _> = parse_body(b"not json", "track");
        assert!(matches!(result, Err(SessionError::Protocol(_))));
    }
}
