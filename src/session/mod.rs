//! Session state and its read-only projection.

pub mod state;

pub use state::{SessionSnapshot, SessionState, SessionTier};
