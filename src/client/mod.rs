//! Remote authority client.
//!
//! [`RemoteAuthority`] is the contract the session manager depends on;
//! [`http::HttpAuthority`] implements it over HTTPS with reqwest.

pub mod http;

use crate::protocol::models::{
    EligibilityResponse, LicenseCheckResponse, LoginRequest, LoginResponse, SignupRequest,
    SignupResponse, TrackRequest, TrackResponse,
};
use crate::SessionError;
use async_trait::async_trait;

/// Calls the session manager makes against the remote authority.
///
/// Implementations map HTTP 401 to [`SessionError::Unauthorized`], 403 to
/// [`SessionError::Forbidden`] and every other non-success status to
/// [`SessionError::Rejected`], carrying the body's `error` text.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Install or clear the default bearer credential for subsequent calls.
    fn set_bearer(&self, token: Option<&str>);

    /// Exchange email and password for a token and user record.
    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, SessionError>;

    /// Register a new account.
    async fn signup(&self, request: &SignupRequest<'_>) -> Result<SignupResponse, SessionError>;

    /// Session and license check for the current bearer credential.
    async fn check_license(&self) -> Result<LicenseCheckResponse, SessionError>;

    /// Ask whether one more download is allowed today.
    async fn check_eligibility(&self) -> Result<EligibilityResponse, SessionError>;

    /// Record a completed download.
    async fn track_download(
        &self,
        request: &TrackRequest<'_>,
    ) -> Result<TrackResponse, SessionError>;
}
