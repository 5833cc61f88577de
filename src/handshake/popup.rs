//! Popup geometry and the window seams the handshake drives.

use crate::config::HandshakeConfig;
use crate::SessionError;
use std::sync::Arc;
use url::Url;

/// Window name given to the sign-in popup.
pub const POPUP_NAME: &str = "google-signin";

/// Position and size of the host window, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Outer width.
    pub width: u32,
    /// Outer height.
    pub height: u32,
}

/// Where the popup opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGeometry {
    /// Left edge in screen pixels.
    pub left: i32,
    /// Top edge in screen pixels.
    pub top: i32,
    /// Popup width.
    pub width: u32,
    /// Popup height.
    pub height: u32,
}

impl PopupGeometry {
    /// Center a `width` x `height` popup over the host window. A popup larger
    /// than the host is pinned to the host's top-left corner.
    pub fn centered(host: &WindowGeometry, width: u32, height: u32) -> Self {
        let offset = |outer: u32, inner: u32| (outer.saturating_sub(inner) / 2) as i32;
        Self {
            left: host.x.saturating_add(offset(host.width, width)),
            top: host.y.saturating_add(offset(host.height, height)),
            width,
            height,
        }
    }

    /// Window feature string for `window.open`-style hosts.
    pub fn features(&self) -> String {
        format!(
            "width={},height={},left={},top={},toolbar=no,menubar=no,scrollbars=yes",
            self.width, self.height, self.left, self.top
        )
    }
}

/// A secondary window opened for sign-in.
pub trait PopupWindow: Send + Sync {
    /// Whether the window has been closed, by the user or programmatically.
    fn is_closed(&self) -> bool;

    /// Close the window. Closing an already-closed window is a no-op.
    fn close(&self);
}

/// The window the handshake is started from.
pub trait WindowHost: Send + Sync {
    /// Current position and size.
    fn geometry(&self) -> WindowGeometry;

    /// Open a popup. `None` means the popup was blocked.
    fn open_popup(
        &self,
        url: &Url,
        name: &str,
        geometry: &PopupGeometry,
    ) -> Option<Arc<dyn PopupWindow>>;
}

/// Sign-in page URL with the callback URL attached.
pub fn sign_in_url(config: &HandshakeConfig) -> Result<Url, SessionError> {
    let mut url = Url::parse(config.sign_in_url)
        .map_err(|e| SessionError::ConfigError(format!("Invalid sign_in_url: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("callback", config.callback_url);
    Ok(url)
}
