//! Download access decisions.
//!
//! A license exempts the account from the daily quota: counters stay
//! visible but never gate a download.

use serde::Serialize;

/// Remaining-download count at or below which the quota is shown as low.
pub const LOW_QUOTA_THRESHOLD: u32 = 2;

/// Outcome of applying the access policy to the current counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadDecision {
    /// Licensed account, quota does not apply.
    Unlimited,
    /// Quota still has room.
    Allowed {
        /// Downloads left today.
        remaining: u32,
    },
    /// Daily quota used up.
    QuotaReached,
}

impl DownloadDecision {
    /// Whether a download may start.
    pub fn allows_download(&self) -> bool {
        !matches!(self, DownloadDecision::QuotaReached)
    }
}

/// Display band for the remaining quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuotaLevel {
    /// Licensed, no quota.
    Unlimited,
    /// More than [`LOW_QUOTA_THRESHOLD`] downloads left.
    Healthy,
    /// One or two downloads left.
    Low,
    /// Nothing left today.
    Exhausted,
}

/// Combine the license flag with the authority's quota verdict.
///
/// A licensed account can always download, whatever the counters say.
pub fn effective_can_download(has_license: bool, quota_allows: bool) -> bool {
    has_license || quota_allows
}

/// Decide whether a download may start.
pub fn decide(has_license: bool, can_download: bool, remaining: u32) -> DownloadDecision {
    if has_license {
        DownloadDecision::Unlimited
    } else if can_download {
        DownloadDecision::Allowed { remaining }
    } else {
        DownloadDecision::QuotaReached
    }
}

/// Display band for the remaining quota.
pub fn quota_level(has_license: bool, remaining: u32) -> QuotaLevel {
    match (has_license, remaining) {
        (true, _) => QuotaLevel::Unlimited,
        (false, 0) => QuotaLevel::Exhausted,
        (false, n) if n <= LOW_QUOTA_THRESHOLD => QuotaLevel::Low,
        _ => QuotaLevel::Healthy,
    }
}
