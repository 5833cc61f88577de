//! Notification sink: the UI side of the session manager.

use crate::session::SessionSnapshot;
use tracing::debug;

/// Receives state changes and UI signals from the core.
///
/// `session_changed` is invoked after every state transition. The other
/// hooks are requests the UI may honor; they default to no-ops.
pub trait NotificationSink: Send + Sync {
    /// Session state changed.
    fn session_changed(&self, snapshot: &SessionSnapshot);

    /// Sign-in completed; close any login UI.
    fn close_login_prompt(&self) {}

    /// The authority no longer accepts the session; ask the user to sign in.
    fn prompt_login(&self) {}

    /// Daily quota is used up; offer an upgrade.
    fn prompt_upgrade(&self) {}

    /// Federated sign-in ended with an error.
    fn federated_login_failed(&self, message: &str) {
        let _ = message;
    }
}

/// Sink that only logs. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        debug!(
            tier = ?snapshot.tier(),
            remaining = snapshot.downloads_remaining,
            "Session changed"
        );
    }

    fn prompt_login(&self) {
        debug!("Login prompt requested");
    }

    fn prompt_upgrade(&self) {
        debug!("Upgrade prompt requested");
    }

    fn federated_login_failed(&self, message: &str) {
        debug!(reason = message, "Federated sign-in failed");
    }
}
