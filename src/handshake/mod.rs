//! Federated (Google) sign-in through a popup window.
//!
//! [`FederatedLogin::start`] registers a listener, opens the provider's
//! sign-in page in a popup and starts a watchdog. The host routes every
//! cross-window message into [`Handshake::on_message`] together with the
//! origin the message declared.
//!
//! The listener is released exactly once, by whichever comes first:
//! - an accepted success message (the session is then established the same
//!   way a password login establishes it)
//! - an accepted error message
//! - the popup closing without a message, after a grace delay
//! - the `Handshake` being cancelled or dropped
//!
//! Messages from origins outside the allow-list are logged and discarded
//! without releasing the listener.

pub mod message;
pub mod origin;
pub mod popup;
pub mod subscription;

use crate::config::HandshakeConfig;
use crate::manager::{AuthOutcome, SessionManager};
use crate::SessionError;
use message::CompletionMessage;
use origin::OriginAllowList;
use popup::{sign_in_url, PopupGeometry, PopupWindow, WindowHost, POPUP_NAME};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use subscription::{Release, Subscription};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Why a message had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The listener was already released.
    NotListening,
    /// The declared origin is not allow-listed.
    OriginRejected,
    /// Allowed origin, but not a handshake message.
    Unrecognized,
}

/// What a delivered message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// Nothing happened.
    Ignored(IgnoreReason),
    /// A success message was accepted and the session transition ran.
    SignedIn(AuthOutcome),
    /// An error message was accepted.
    Failed {
        /// User-facing failure text.
        message: String,
    },
}

/// Starts federated sign-in handshakes.
pub struct FederatedLogin {
    config: HandshakeConfig,
    allow_list: Arc<OriginAllowList>,
    host: Arc<dyn WindowHost>,
    manager: Arc<SessionManager>,
}

impl FederatedLogin {
    /// Create a handshake starter for `host`, feeding `manager`.
    pub fn new(
        config: HandshakeConfig,
        host: Arc<dyn WindowHost>,
        manager: Arc<SessionManager>,
    ) -> Result<Self, SessionError> {
        let allow_list = Arc::new(OriginAllowList::from_config(&config)?);
        sign_in_url(&config)?;
        Ok(Self {
            config,
            allow_list,
            host,
            manager,
        })
    }

    /// Open the sign-in popup and start listening.
    ///
    /// Must be called from within a Tokio runtime; the abandonment watchdog
    /// runs as a task on it.
    pub fn start(&self) -> Result<Handshake, SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SessionError::ConfigError("federated login requires a Tokio runtime".to_string())
        })?;

        let url = sign_in_url(&self.config)?;
        let geometry = PopupGeometry::centered(
            &self.host.geometry(),
            self.config.popup_width,
            self.config.popup_height,
        );

        // Listener first, so a popup that completes instantly is not missed.
        let subscription = Arc::new(Subscription::new());

        let popup = self.host.open_popup(&url, POPUP_NAME, &geometry);
        match &popup {
            Some(popup) => {
                debug!(features = %geometry.features(), "Sign-in popup opened");
                subscription.attach_popup(Arc::clone(popup));
            }
            None => warn!("Sign-in popup was blocked"),
        }
        let popup_opened = popup.is_some();

        let watchdog = runtime.spawn(watch_popup(
            Arc::clone(&subscription),
            popup,
            self.config.poll_interval,
            self.config.close_grace,
        ));
        subscription.attach_watchdog(watchdog);

        Ok(Handshake {
            subscription,
            allow_list: Arc::clone(&self.allow_list),
            manager: Arc::clone(&self.manager),
            popup_opened,
        })
    }
}

/// One in-progress federated sign-in.
///
/// Dropping the handle cancels the handshake.
pub struct Handshake {
    subscription: Arc<Subscription>,
    allow_list: Arc<OriginAllowList>,
    manager: Arc<SessionManager>,
    popup_opened: bool,
}

impl Handshake {
    /// Deliver a cross-window message that declared `origin`.
    pub async fn on_message(&self, origin: &str, data: &Value) -> HandshakeEvent {
        if !self.subscription.is_listening() {
            debug!(origin, "Handshake listener already released, ignoring message");
            return HandshakeEvent::Ignored(IgnoreReason::NotListening);
        }
        if !self.allow_list.allows(origin) {
            warn!(origin, "Discarding sign-in message from unexpected origin");
            return HandshakeEvent::Ignored(IgnoreReason::OriginRejected);
        }

        match CompletionMessage::classify(data) {
            CompletionMessage::Unrecognized => {
                HandshakeEvent::Ignored(IgnoreReason::Unrecognized)
            }
            CompletionMessage::Success { token, user } => {
                if !self.subscription.release(Release::Completed) {
                    return HandshakeEvent::Ignored(IgnoreReason::NotListening);
                }
                info!("Federated sign-in completed");
                HandshakeEvent::SignedIn(self.manager.establish_session(token, user).await)
            }
            CompletionMessage::Error { message } => {
                if !self.subscription.release(Release::Failed) {
                    return HandshakeEvent::Ignored(IgnoreReason::NotListening);
                }
                warn!(reason = %message, "Federated sign-in failed");
                self.manager.report_federated_failure(&message);
                HandshakeEvent::Failed { message }
            }
        }
    }

    /// Whether the listener is still registered.
    pub fn is_listening(&self) -> bool {
        self.subscription.is_listening()
    }

    /// How the handshake ended, if it has.
    pub fn outcome(&self) -> Option<Release> {
        self.subscription.released()
    }

    /// Whether the host actually opened a popup.
    pub fn popup_opened(&self) -> bool {
        self.popup_opened
    }

    /// Stop listening and close the popup. Returns `false` if the handshake
    /// had already ended.
    pub fn cancel(&self) -> bool {
        self.subscription.release(Release::Cancelled)
    }
}

impl Drop for Handshake {
    fn drop(&mut self) {
        self.subscription.release(Release::Cancelled);
    }
}

/// Poll for the popup closing; release the listener `grace` after it does.
/// A blocked popup counts as closed.
async fn watch_popup(
    subscription: Arc<Subscription>,
    popup: Option<Arc<dyn PopupWindow>>,
    poll_interval: Duration,
    grace: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !subscription.is_listening() {
            return;
        }
        if popup.as_ref().map_or(true, |p| p.is_closed()) {
            break;
        }
    }

    debug!(grace_ms = grace.as_millis() as u64, "Sign-in popup closed, waiting for late message");
    tokio::time::sleep(grace).await;

    if subscription.release(Release::Abandoned) {
        info!("Sign-in popup closed without completing");
    }
}
