//! # Sessionward
//!
//! **Client-side session, license and daily download quota management.**
//!
//! Sessionward keeps the single authoritative record of who is signed in,
//! whether their account is licensed, and how many downloads they have left
//! today. It reconciles that record with a remote authority, persists the
//! credentials across restarts, and completes federated (Google) sign-in
//! through a popup handshake.
//!
//! ## Features
//!
//! - **Session state machine**: Anonymous, AuthenticatedFree and
//!   AuthenticatedLicensed, driven only through [`SessionManager`]
//! - **Durable credentials**: bearer token and user profile written and
//!   removed together
//! - **Reconciliation**: an unauthorized session check forces logout,
//!   transient failures never do
//! - **License exemption**: licensed accounts are never blocked by quota
//! - **Popup handshake**: origin allow-list, exactly-once listener release,
//!   abandonment watchdog
//!
//! ## Quickstart
//!
//! ```no_run
//! use sessionward::{HandshakeConfig, LogSink, SessionConfig, SessionManager};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), sessionward::SessionError> {
//! let config = SessionConfig {
//!     app_name: "sample-scratcher/1.0.0",
//!     api_base_url: "https://api.example.com",
//!     product_origin: "sample-scratcher",
//!     store_namespace: "sample-scratcher",
//!     default_daily_quota: 5,
//!     request_timeout: Duration::from_secs(30),
//!     handshake: HandshakeConfig::new(
//!         "https://api.example.com/auth/google",
//!         "https://example.com/auth/callback",
//!         "https://example.com",
//!     ),
//! };
//!
//! let manager = SessionManager::new(config, Arc::new(LogSink))?;
//! manager.bootstrap().await;
//!
//! let outcome = manager.login("a@example.com", "secret").await;
//! if outcome.is_success() && manager.check_download_eligibility().await.is_allowed() {
//!     // ... perform the download ...
//!     manager.track_download("preset1").await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure handling
//!
//! - Bad credentials, duplicate signup, quota exceeded: structured outcomes
//!   carrying a message
//! - Unauthorized session check: full logout
//! - Network errors, timeouts, unexpected bodies: logged, state unchanged
//! - Handshake messages from unknown origins: discarded
//!
//! The bearer token never appears in logs; a short SHA-256 fingerprint
//! stands in for it.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Persistence layer
pub mod store;

// State and policy
pub mod policy;
pub mod session;

// UI seam
pub mod notify;

// Manager (main public API)
pub mod manager;

// Federated login
pub mod handshake;

// Re-exports for public API
pub use client::http::HttpAuthority;
pub use client::RemoteAuthority;
pub use clock::{Clock, SystemClock};
pub use config::{HandshakeConfig, SessionConfig};
pub use errors::SessionError;
pub use handshake::{FederatedLogin, Handshake, HandshakeEvent, IgnoreReason};
pub use manager::{
    AuthOutcome, DenialReason, EligibilityOutcome, Reconciled, SessionManager, SubmitGuard,
    TrackOutcome,
};
pub use notify::{LogSink, NotificationSink};
pub use protocol::models::UserProfile;
pub use session::{SessionSnapshot, SessionState, SessionTier};
pub use store::file::FileCredentialStore;
pub use store::memory::MemoryCredentialStore;
pub use store::{CredentialStore, StoredCredentials};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
