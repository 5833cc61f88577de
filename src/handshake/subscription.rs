//! The handshake's message listener as a cancelable subscription.
//!
//! A subscription starts out listening and is released exactly once. The
//! release closes the popup if it is still open and stops the watchdog.

use crate::handshake::popup::PopupWindow;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

const LISTENING: u8 = 0;

/// Why a subscription was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// A success message was accepted.
    Completed,
    /// An error message (or unusable success message) was accepted.
    Failed,
    /// The popup closed without a message.
    Abandoned,
    /// The owner dropped or cancelled the handshake.
    Cancelled,
}

impl Release {
    fn code(self) -> u8 {
        match self {
            Release::Completed => 1,
            Release::Failed => 2,
            Release::Abandoned => 3,
            Release::Cancelled => 4,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Release::Completed),
            2 => Some(Release::Failed),
            3 => Some(Release::Abandoned),
            4 => Some(Release::Cancelled),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Resources {
    popup: Option<Arc<dyn PopupWindow>>,
    watchdog: Option<JoinHandle<()>>,
}

/// Registered listener for one handshake.
pub struct Subscription {
    state: AtomicU8,
    resources: Mutex<Resources>,
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription {
    /// A listening subscription with no resources attached yet.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LISTENING),
            resources: Mutex::new(Resources::default()),
        }
    }

    /// Whether messages are still being accepted.
    pub fn is_listening(&self) -> bool {
        self.state.load(Ordering::Acquire) == LISTENING
    }

    /// How the subscription ended, if it has.
    pub fn released(&self) -> Option<Release> {
        Release::from_code(self.state.load(Ordering::Acquire))
    }

    /// Attach the popup so release can close it.
    pub fn attach_popup(&self, popup: Arc<dyn PopupWindow>) {
        let mut resources = self.resources();
        if self.is_listening() {
            resources.popup = Some(popup);
        } else {
            drop(resources);
            close_if_open(popup.as_ref());
        }
    }

    /// Attach the watchdog task so release can stop it.
    pub fn attach_watchdog(&self, watchdog: JoinHandle<()>) {
        let mut resources = self.resources();
        if self.is_listening() {
            resources.watchdog = Some(watchdog);
        } else {
            watchdog.abort();
        }
    }

    /// Release the listener. Returns `true` only for the call that actually
    /// released it; every later call is a no-op returning `false`.
    pub fn release(&self, reason: Release) -> bool {
        if self
            .state
            .compare_exchange(LISTENING, reason.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let Resources { popup, watchdog } = std::mem::take(&mut *self.resources());
        if let Some(popup) = popup {
            close_if_open(popup.as_ref());
        }
        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }
        true
    }

    fn resources(&self) -> MutexGuard<'_, Resources> {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn close_if_open(popup: &dyn PopupWindow) {
    if !popup.is_closed() {
        popup.close();
    }
}
