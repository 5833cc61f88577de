//! Sessionward configuration.

use crate::SessionError;
use std::time::Duration;
use url::Url;

/// Development origins that may complete a federated login handshake.
pub const DEFAULT_DEV_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Configuration for the session manager and its remote authority.
///
/// All product-specific values are compile-time constants of the embedding
/// application, like the endpoints and the signup origin tag.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application name used in the User-Agent (e.g., "sample-scratcher/1.4.0").
    pub app_name: &'static str,

    /// Base URL of the remote authority (e.g., "https://api.example.com").
    pub api_base_url: &'static str,

    /// Product origin tag sent with every signup.
    pub product_origin: &'static str,

    /// Namespace for the credential store directory.
    pub store_namespace: &'static str,

    /// Quota shown before the remote authority has reported one.
    /// The authority owns the real value.
    pub default_daily_quota: u32,

    /// Timeout applied to every remote call.
    pub request_timeout: Duration,

    /// Federated login handshake settings.
    pub handshake: HandshakeConfig,
}

/// Configuration for the federated login popup handshake.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Provider sign-in page opened in the popup.
    pub sign_in_url: &'static str,

    /// Completion page the sign-in flow redirects to; passed as `callback`.
    pub callback_url: &'static str,

    /// Production origin allowed to post the completion message.
    pub production_origin: &'static str,

    /// Development host aliases allowed to post the completion message.
    pub dev_origins: &'static [&'static str],

    /// Popup width in pixels.
    pub popup_width: u32,

    /// Popup height in pixels.
    pub popup_height: u32,

    /// How often the watchdog checks whether the popup was closed.
    pub poll_interval: Duration,

    /// Delay after popup closure before the listener is released, so a
    /// message already in flight can still land.
    pub close_grace: Duration,
}

impl HandshakeConfig {
    /// Handshake settings with the stock popup size and timings.
    pub fn new(
        sign_in_url: &'static str,
        callback_url: &'static str,
        production_origin: &'static str,
    ) -> Self {
        Self {
            sign_in_url,
            callback_url,
            production_origin,
            dev_origins: DEFAULT_DEV_ORIGINS,
            popup_width: 500,
            popup_height: 600,
            poll_interval: Duration::from_millis(500),
            close_grace: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), SessionError> {
        parse_url("api_base_url", self.api_base_url)?;
        parse_url("handshake.sign_in_url", self.handshake.sign_in_url)?;
        parse_url("handshake.callback_url", self.handshake.callback_url)?;
        parse_url("handshake.production_origin", self.handshake.production_origin)?;

        if self.store_namespace.is_empty() {
            return Err(SessionError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if self.product_origin.is_empty() {
            return Err(SessionError::ConfigError(
                "product_origin cannot be empty".to_string(),
            ));
        }
        if self.handshake.popup_width == 0 || self.handshake.popup_height == 0 {
            return Err(SessionError::ConfigError(
                "popup dimensions must be non-zero".to_string(),
            ));
        }
        if self.handshake.poll_interval.is_zero() {
            return Err(SessionError::ConfigError(
                "handshake.poll_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the User-Agent header value.
    ///
    /// Format: `<app>/sessionward-<version>`
    pub fn user_agent(&self) -> String {
        format!("{}/sessionward-{}", self.app_name, env!("CARGO_PKG_VERSION"))
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, SessionError> {
    Url::parse(value)
        .map_err(|e| SessionError::ConfigError(format!("{} is not a valid URL: {}", field, e)))
}
