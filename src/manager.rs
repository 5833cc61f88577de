//! Session Manager - the main public API for Sessionward.
//!
//! The `SessionManager` owns the session state and drives every transition:
//! - Bootstrap from the credential store
//! - Login, signup (login on success) and logout
//! - Reconciliation with the remote authority
//! - Download eligibility checks and download tracking
//!
//! Remote failures never escape as panics. Every operation returns an
//! outcome; only [`SessionManager::reconcile`] hands transient errors back.

use crate::client::http::HttpAuthority;
use crate::client::RemoteAuthority;
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::notify::NotificationSink;
use crate::policy::access::effective_can_download;
use crate::protocol::models::{
    EligibilityResponse, LoginRequest, LoginResponse, SignupRequest, TrackRequest, UserProfile,
};
use crate::session::{SessionSnapshot, SessionState};
use crate::store::file::FileCredentialStore;
use crate::store::{token_fingerprint, CredentialStore, StoredCredentials};
use crate::SessionError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Message used when a login fails without a server-supplied reason.
pub const LOGIN_FALLBACK: &str = "Login failed";

/// Message used when a signup fails without a server-supplied reason.
pub const SIGNUP_FALLBACK: &str = "Registration failed";

/// Message used when download tracking fails without a server-supplied reason.
pub const TRACK_FALLBACK: &str = "Download tracking failed";

/// Result of a login, signup or federated sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A session is established.
    Success,
    /// Nothing changed; show `message` inline.
    Failure {
        /// Human-readable reason.
        message: String,
    },
}

impl AuthOutcome {
    /// Whether a session was established.
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Failure {
            message: message.into(),
        }
    }
}

/// Result of a reconciliation that did not fail transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// License and quota refreshed.
    Refreshed,
    /// The authority rejected the token; the session was logged out.
    SessionExpired,
    /// No session to reconcile.
    NoSession,
    /// The session changed while the check was in flight; the response was dropped.
    Superseded,
}

/// Why a download was denied without a verdict from the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The authority rejected the session; the user was asked to sign in.
    Unauthenticated,
    /// The authority could not be reached or answered with an error.
    Unavailable,
}

/// Result of a download eligibility check.
#[derive(Debug, Clone, PartialEq)]
pub enum EligibilityOutcome {
    /// The authority's answer, verbatim.
    Checked(EligibilityResponse),
    /// No answer; the download must not start.
    Denied(DenialReason),
}

impl EligibilityOutcome {
    /// Whether the download may start. A license always allows it.
    pub fn is_allowed(&self) -> bool {
        match self {
            EligibilityOutcome::Checked(response) => {
                effective_can_download(response.is_premium, response.allowed)
            }
            EligibilityOutcome::Denied(_) => false,
        }
    }
}

/// Result of tracking a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Recorded; `remaining` is the authority's new count, if it sent one.
    Tracked {
        /// Downloads left today.
        remaining: Option<u32>,
    },
    /// Daily quota exceeded; the upgrade prompt was signaled.
    QuotaExceeded,
    /// Not recorded; state unchanged.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

/// Held by the UI while a login or signup submission is in flight.
///
/// Released on drop.
#[derive(Debug)]
pub struct SubmitGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Main session manager.
///
/// Create one instance per process and share it (`Arc<SessionManager>`).
pub struct SessionManager {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    authority: Arc<dyn RemoteAuthority>,
    store: Arc<dyn CredentialStore>,
    sink: Arc<dyn NotificationSink>,
    state: RwLock<SessionState>,
    bootstrapped: AtomicBool,
    submitting: Arc<AtomicBool>,
}

impl SessionManager {
    /// Create a session manager backed by the HTTP authority client and the
    /// file credential store.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    /// - The store directory cannot be created
    pub fn new(
        config: SessionConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let authority = Arc::new(HttpAuthority::new(&config)?);
        let store = Arc::new(FileCredentialStore::new(config.store_namespace)?);
        Ok(Self::with_clock(
            config,
            authority,
            store,
            sink,
            Arc::new(SystemClock),
        ))
    }

    /// Create a session manager from explicit collaborators.
    pub fn with_parts(
        config: SessionConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::with_clock(
            config,
            authority,
            store,
            sink,
            Arc::new(SystemClock),
        ))
    }

    /// Create a session manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: SessionConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::with_clock(config, authority, store, sink, clock))
    }

    fn with_clock(
        config: SessionConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = SessionState::new(config.default_daily_quota);
        Self {
            config,
            clock,
            authority,
            store,
            sink,
            state: RwLock::new(state),
            bootstrapped: AtomicBool::new(false),
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restore a persisted session, if any, and reconcile it.
    ///
    /// Only the first call reads the store; later calls just return the
    /// current snapshot. Always notifies the sink.
    pub async fn bootstrap(&self) -> SessionSnapshot {
        if self.bootstrapped.swap(true, Ordering::AcqRel) {
            debug!("Session already bootstrapped");
            return self.notify().await;
        }

        // Read under the write guard so a concurrent logout cannot clear the
        // store between the read and the restore.
        let restored = {
            let mut state = self.state.write().await;
            let stored = match self.store.load() {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(error = %e, "Could not read persisted credentials");
                    None
                }
            };
            match stored {
                Some(StoredCredentials { token, user }) => {
                    info!(token = %token_fingerprint(&token), "Restoring persisted session");
                    self.authority.set_bearer(Some(&token));
                    state.establish(token, user);
                    true
                }
                None => false,
            }
        };

        if restored {
            if let Err(e) = self.reconcile().await {
                warn!(error = %e, "Could not reconcile restored session, keeping it");
            }
        }

        self.notify().await
    }

    /// Refresh license and quota from the remote authority.
    ///
    /// An unauthorized answer logs the session out. Any other failure leaves
    /// the state untouched and is returned.
    pub async fn reconcile(&self) -> Result<Reconciled, SessionError> {
        let Some(token) = self.state.read().await.token().map(String::from) else {
            return Ok(Reconciled::NoSession);
        };

        match self.authority.check_license().await {
            Ok(response) => {
                {
                    let mut state = self.state.write().await;
                    if state.token() != Some(token.as_str()) {
                        debug!("Session changed during reconciliation, dropping response");
                        return Ok(Reconciled::Superseded);
                    }
                    state.apply_license_check(&response, self.clock.now_utc());
                }
                debug!(has_license = response.has_license, "Session reconciled");
                self.notify().await;
                Ok(Reconciled::Refreshed)
            }
            Err(e) if e.is_unauthorized() => {
                if self.state.read().await.token() != Some(token.as_str()) {
                    return Ok(Reconciled::Superseded);
                }
                warn!(token = %token_fingerprint(&token), "Session rejected by authority, logging out");
                self.logout().await;
                Ok(Reconciled::SessionExpired)
            }
            Err(e) => {
                warn!(error = %e, "Session check failed");
                Err(e)
            }
        }
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let request = LoginRequest { email, password };

        match self.authority.login(&request).await {
            Ok(LoginResponse {
                token: Some(token),
                user: Some(user),
            }) if !token.is_empty() => self.establish_session(token, user).await,
            Ok(_) => {
                warn!("Login response carried no session");
                AuthOutcome::failure(LOGIN_FALLBACK)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                AuthOutcome::failure(e.user_message(LOGIN_FALLBACK))
            }
        }
    }

    /// Register an account, then sign in with the same credentials.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> AuthOutcome {
        let request = SignupRequest {
            email,
            password,
            name,
            origin: self.config.product_origin,
        };

        match self.authority.signup(&request).await {
            Ok(response) if response.created() => {
                info!("Account created, signing in");
                self.login(email, password).await
            }
            Ok(_) => {
                warn!("Signup response carried no user");
                AuthOutcome::failure(SIGNUP_FALLBACK)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                AuthOutcome::failure(e.user_message(SIGNUP_FALLBACK))
            }
        }
    }

    /// Install a session obtained by login or federated sign-in.
    ///
    /// Persists the credentials, installs the bearer credential, refreshes
    /// quota, notifies the sink and asks it to close the login UI. State,
    /// bearer and store change under one write guard, so a concurrent
    /// logout or login cannot leave the store holding another session.
    ///
    /// A token the authority rejects on the follow-up check is logged out
    /// again and reported as `Failure("Login failed")`, with the login UI
    /// left open. The session ends anonymous either way; the outcome says
    /// so instead of reporting a sign-in that did not stick.
    pub async fn establish_session(&self, token: String, user: UserProfile) -> AuthOutcome {
        info!(token = %token_fingerprint(&token), "Establishing session");
        {
            let mut state = self.state.write().await;
            self.authority.set_bearer(Some(&token));
            state.establish(token.clone(), user.clone());
            if let Err(e) = self.store.save(&StoredCredentials { token, user }) {
                warn!(error = %e, "Could not persist credentials");
            }
        }

        match self.reconcile().await {
            Ok(Reconciled::SessionExpired) => {
                return AuthOutcome::failure(LOGIN_FALLBACK);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not refresh quota after sign-in"),
        }

        self.notify().await;
        self.sink.close_login_prompt();
        AuthOutcome::Success
    }

    /// Drop the session, locally and in the store. Never fails.
    pub async fn logout(&self) -> SessionSnapshot {
        {
            let mut state = self.state.write().await;
            state.reset();
            self.authority.set_bearer(None);
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Could not clear persisted credentials");
            }
        }
        info!("Logged out");

        self.notify().await
    }

    /// Ask the authority whether one more download is allowed.
    ///
    /// An unauthorized answer asks the sink to prompt for sign-in but does
    /// not log out.
    pub async fn check_download_eligibility(&self) -> EligibilityOutcome {
        match self.authority.check_eligibility().await {
            Ok(response) => {
                self.state.write().await.apply_eligibility(&response);
                debug!(allowed = response.allowed, "Download eligibility checked");
                self.notify().await;
                EligibilityOutcome::Checked(response)
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Eligibility check rejected the session");
                self.sink.prompt_login();
                EligibilityOutcome::Denied(DenialReason::Unauthenticated)
            }
            Err(e) => {
                warn!(error = %e, "Eligibility check failed");
                EligibilityOutcome::Denied(DenialReason::Unavailable)
            }
        }
    }

    /// Record a completed download under `label`.
    pub async fn track_download(&self, label: &str) -> TrackOutcome {
        let request = TrackRequest { preset_name: label };

        match self.authority.track_download(&request).await {
            Ok(response) if response.success => {
                self.state.write().await.apply_tracked(response.remaining);
                debug!(label, remaining = ?response.remaining, "Download tracked");
                self.notify().await;
                TrackOutcome::Tracked {
                    remaining: response.remaining,
                }
            }
            Ok(response) => {
                warn!(label, "Authority declined to track download");
                TrackOutcome::Failed {
                    message: response
                        .error
                        .unwrap_or_else(|| TRACK_FALLBACK.to_string()),
                }
            }
            Err(SessionError::Forbidden { .. }) => {
                info!(label, "Daily download quota exceeded");
                self.sink.prompt_upgrade();
                TrackOutcome::QuotaExceeded
            }
            Err(e) => {
                warn!(error = %e, label, "Track download failed");
                TrackOutcome::Failed {
                    message: e.user_message(TRACK_FALLBACK),
                }
            }
        }
    }

    /// Claim the submission guard, or `None` if a submission is in flight.
    pub fn try_begin_submit(&self) -> Option<SubmitGuard> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard {
                flag: Arc::clone(&self.submitting),
            })
    }

    /// Current read-only projection of the session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    /// Copy of the full session state, token included.
    pub async fn current_state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn report_federated_failure(&self, message: &str) {
        self.sink.federated_login_failed(message);
    }

    async fn notify(&self) -> SessionSnapshot {
        let snapshot = self.snapshot().await;
        self.sink.session_changed(&snapshot);
        snapshot
    }
}
