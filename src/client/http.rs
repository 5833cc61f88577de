//! Reqwest-based HTTP client for the remote authority.

use crate::client::RemoteAuthority;
use crate::config::SessionConfig;
use crate::protocol::models::{
    error_message, parse_body, EligibilityResponse, LicenseCheckResponse, LoginRequest,
    LoginResponse, SignupRequest, SignupResponse, TrackRequest, TrackResponse,
};
use crate::SessionError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Signup endpoint path.
pub const SIGNUP_PATH: &str = "/api/auth/signup";
/// Session/license check endpoint path.
pub const LICENSE_CHECK_PATH: &str = "/api/license/check";
/// Download eligibility endpoint path.
pub const ELIGIBILITY_PATH: &str = "/api/downloads/check";
/// Download tracking endpoint path.
pub const TRACK_PATH: &str = "/api/downloads/track";

/// HTTP client for the remote authority.
pub struct HttpAuthority {
    client: Client,
    base_url: Url,
    user_agent: String,
    timeout: Duration,
    bearer: RwLock<Option<String>>,
}

impl HttpAuthority {
    /// Create a new client from config.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let base_url = Url::parse(config.api_base_url)
            .map_err(|e| SessionError::ConfigError(format!("Invalid api_base_url: {}", e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            user_agent: config.user_agent(),
            timeout: config.request_timeout,
            bearer: RwLock::new(None),
        })
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a bearer credential is installed.
    pub fn has_bearer(&self) -> bool {
        self.bearer().is_some()
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// Paths are absolute, so a path component on the base URL is replaced.
    pub fn endpoint(&self, path: &str) -> Result<Url, SessionError> {
        self.base_url
            .join(path)
            .map_err(|e| SessionError::ConfigError(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn bearer(&self) -> Option<String> {
        self.bearer
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, SessionError> {
        let mut request = request
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;

        check_status(status, &body)?;
        parse_body(&body, endpoint)
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    fn set_bearer(&self, token: Option<&str>) {
        let mut bearer = self
            .bearer
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *bearer = token.map(String::from);
    }

    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, SessionError> {
        let url = self.endpoint(LOGIN_PATH)?;
        self.send(self.client.post(url).json(request), "login").await
    }

    async fn signup(&self, request: &SignupRequest<'_>) -> Result<SignupResponse, SessionError> {
        let url = self.endpoint(SIGNUP_PATH)?;
        self.send(self.client.post(url).json(request), "signup").await
    }

    async fn check_license(&self) -> Result<LicenseCheckResponse, SessionError> {
        let url = self.endpoint(LICENSE_CHECK_PATH)?;
        self.send(self.client.get(url), "license check").await
    }

    async fn check_eligibility(&self) -> Result<EligibilityResponse, SessionError> {
        let url = self.endpoint(ELIGIBILITY_PATH)?;
        self.send(self.client.get(url), "download eligibility").await
    }

    async fn track_download(
        &self,
        request: &TrackRequest<'_>,
    ) -> Result<TrackResponse, SessionError> {
        let url = self.endpoint(TRACK_PATH)?;
        self.send(self.client.post(url).json(request), "download tracking")
            .await
    }
}

/// Map a response status to the error taxonomy.
pub fn check_status(status: u16, body: &[u8]) -> Result<(), SessionError> {
    match status {
        200..=299 => Ok(()),
        401 => Err(SessionError::Unauthorized {
            message: error_message(body),
        }),
        403 => Err(SessionError::Forbidden {
            message: error_message(body),
        }),
        _ => Err(SessionError::Rejected {
            status,
            message: error_message(body),
        }),
    }
}

fn transport_error(e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout
    } else {
        SessionError::Transport(format!("Request failed: {}", e))
    }
}
