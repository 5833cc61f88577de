//! Download access policy.

pub mod access;
