//! The authoritative in-memory session record.
//!
//! Identity only changes through [`SessionState::establish`] and
//! [`SessionState::reset`], which keeps `authenticated` equivalent to
//! "token and user both present".

use crate::policy::access::{self, DownloadDecision, QuotaLevel};
use crate::protocol::models::{EligibilityResponse, LicenseCheckResponse, UserProfile};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Position in the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionTier {
    /// No session.
    Anonymous,
    /// Signed in, subject to the daily quota.
    AuthenticatedFree,
    /// Signed in with a license.
    AuthenticatedLicensed,
}

/// Session, license and quota state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    authenticated: bool,
    user: Option<UserProfile>,
    token: Option<String>,
    has_license: bool,
    downloads_today: u32,
    downloads_remaining: u32,
    can_download: bool,
    last_reconciled_at: Option<DateTime<Utc>>,
    default_quota: u32,
}

impl SessionState {
    /// Anonymous state with the placeholder quota.
    pub fn new(default_quota: u32) -> Self {
        Self {
            authenticated: false,
            user: None,
            token: None,
            has_license: false,
            downloads_today: 0,
            downloads_remaining: default_quota,
            can_download: true,
            last_reconciled_at: None,
            default_quota,
        }
    }

    /// Install a session. The license flag comes from the user record.
    pub fn establish(&mut self, token: String, user: UserProfile) {
        self.has_license = user.has_license;
        self.can_download = access::effective_can_download(self.has_license, self.can_download);
        self.token = Some(token);
        self.user = Some(user);
        self.authenticated = true;
    }

    /// Back to the anonymous defaults.
    pub fn reset(&mut self) {
        *self = Self::new(self.default_quota);
    }

    /// Apply a session/license check.
    pub fn apply_license_check(&mut self, response: &LicenseCheckResponse, now: DateTime<Utc>) {
        self.has_license = response.has_license;

        if let Some(downloads) = &response.downloads {
            if let Some(today) = downloads.downloads_today {
                self.downloads_today = today;
            }
            if let Some(remaining) = downloads.downloads_remaining {
                self.downloads_remaining = remaining;
            }
            if let Some(can_download) = downloads.can_download {
                self.can_download = can_download;
            }
        }
        self.can_download = access::effective_can_download(self.has_license, self.can_download);
        self.last_reconciled_at = Some(now);
    }

    /// Apply a download eligibility check.
    pub fn apply_eligibility(&mut self, response: &EligibilityResponse) {
        if let Some(today) = response.downloads_today {
            self.downloads_today = today;
        }
        if let Some(remaining) = response.remaining {
            self.downloads_remaining = remaining;
        }
        self.has_license = response.is_premium;
        self.can_download = access::effective_can_download(response.is_premium, response.allowed);
    }

    /// Apply the remaining count reported after a tracked download.
    pub fn apply_tracked(&mut self, remaining: Option<u32>) {
        if let Some(remaining) = remaining {
            self.downloads_remaining = remaining;
        }
    }

    /// Whether a session is established.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Bearer token of the current session.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// User of the current session.
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Whether the account holds a license.
    pub fn has_license(&self) -> bool {
        self.has_license
    }

    /// Downloads left today.
    pub fn downloads_remaining(&self) -> u32 {
        self.downloads_remaining
    }

    /// Whether a download may start.
    pub fn can_download(&self) -> bool {
        self.can_download
    }

    /// `authenticated` holds exactly when token and user are both present.
    pub fn invariants_hold(&self) -> bool {
        self.authenticated == (self.token.is_some() && self.user.is_some())
    }

    /// Read-only projection for observers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            authenticated: self.authenticated,
            user: self.user.clone(),
            has_license: self.has_license,
            downloads_today: self.downloads_today,
            downloads_remaining: self.downloads_remaining,
            can_download: self.can_download,
            daily_quota: self.default_quota,
            last_reconciled_at: self.last_reconciled_at,
        }
    }
}

/// Immutable view of the session handed to the UI.
///
/// The bearer token is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Whether a session is established.
    pub authenticated: bool,
    /// Signed-in user.
    pub user: Option<UserProfile>,
    /// Whether the account holds a license.
    pub has_license: bool,
    /// Downloads used today, as last reported.
    pub downloads_today: u32,
    /// Downloads left today, as last reported.
    pub downloads_remaining: u32,
    /// Whether a download may start.
    pub can_download: bool,
    /// Placeholder quota used for display before the authority reports one.
    pub daily_quota: u32,
    /// Last successful reconciliation.
    pub last_reconciled_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// State machine position.
    pub fn tier(&self) -> SessionTier {
        match (self.authenticated, self.has_license) {
            (false, _) => SessionTier::Anonymous,
            (true, false) => SessionTier::AuthenticatedFree,
            (true, true) => SessionTier::AuthenticatedLicensed,
        }
    }

    /// Name to show: display name, else email, else "User".
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| {
                u.name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .or_else(|| Some(u.email.as_str()).filter(|e| !e.is_empty()))
            })
            .unwrap_or("User")
    }

    /// Whether a download may start right now.
    pub fn download_decision(&self) -> DownloadDecision {
        access::decide(self.has_license, self.can_download, self.downloads_remaining)
    }

    /// Display band for the remaining quota.
    pub fn quota_level(&self) -> QuotaLevel {
        access::quota_level(self.has_license, self.downloads_remaining)
    }

    /// Short quota status line.
    pub fn quota_label(&self) -> String {
        if self.has_license {
            "Unlimited downloads".to_string()
        } else {
            format!(
                "{}/{} downloads today",
                self.downloads_remaining, self.daily_quota
            )
        }
    }
}
