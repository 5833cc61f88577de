//! Wire schemas for the remote authority.

pub mod models;
