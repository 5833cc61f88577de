//! In-memory credential store.

use crate::store::{assemble, encode_user, CredentialStore, StoredCredentials, TOKEN_KEY, USER_KEY};
use crate::SessionError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Credential store kept in process memory.
///
/// Nothing survives a restart; useful for embedding hosts that persist
/// elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of an entry.
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Write a raw entry, bypassing the paired-write rule.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredCredentials>, SessionError> {
        let entries = self.entries();
        assemble(entries.get(TOKEN_KEY).cloned(), entries.get(USER_KEY).cloned())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), SessionError> {
        let user = encode_user(&credentials.user)?;
        let mut entries = self.entries();
        entries.insert(TOKEN_KEY.to_string(), credentials.token.clone());
        entries.insert(USER_KEY.to_string(), user);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut entries = self.entries();
        entries.remove(TOKEN_KEY);
        entries.remove(USER_KEY);
        Ok(())
    }
}
