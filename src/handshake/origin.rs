//! Allow-list of origins that may complete the handshake.

use crate::config::HandshakeConfig;
use crate::SessionError;
use url::{Origin, Url};

/// Origins accepted for completion messages.
///
/// Matching is on the full origin (scheme, host and port). Anything that
/// does not parse as a URL, including the opaque `"null"` origin, is
/// rejected.
#[derive(Debug, Clone)]
pub struct OriginAllowList {
    origins: Vec<Origin>,
}

impl OriginAllowList {
    /// Build an allow-list from origin strings.
    pub fn new<'a, I>(origins: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let origins = origins
            .into_iter()
            .map(|raw| {
                Url::parse(raw).map(|u| u.origin()).map_err(|e| {
                    SessionError::ConfigError(format!("Invalid allowed origin {}: {}", raw, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if origins.is_empty() {
            return Err(SessionError::ConfigError(
                "origin allow-list cannot be empty".to_string(),
            ));
        }
        Ok(Self { origins })
    }

    /// Development aliases plus the production origin.
    pub fn from_config(config: &HandshakeConfig) -> Result<Self, SessionError> {
        Self::new(
            config
                .dev_origins
                .iter()
                .copied()
                .chain(std::iter::once(config.production_origin)),
        )
    }

    /// Whether a message declaring `origin` may be processed.
    pub fn allows(&self, origin: &str) -> bool {
        match Url::parse(origin) {
            Ok(url) => {
                let origin = url.origin();
                origin.is_tuple() && self.origins.contains(&origin)
            }
            Err(_) => false,
        }
    }
}
