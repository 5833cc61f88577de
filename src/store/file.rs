//! File-based credential store with atomic writes.
//!
//! Stores one file per entry under `dirs::data_dir()/<namespace>/`.
//! Uses temp file + rename for atomic writes.

use crate::store::{assemble, encode_user, CredentialStore, StoredCredentials, TOKEN_KEY, USER_KEY};
use crate::SessionError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// File-based credential store.
pub struct FileCredentialStore {
    /// Directory holding the entry files.
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store with the given namespace.
    ///
    /// Entries are stored under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, SessionError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| SessionError::StoreIO("Could not find data directory".to_string()))?;

        Self::with_path(base_dir.join(namespace))
    }

    /// Create a store at a specific directory.
    pub fn with_path(dir: PathBuf) -> Result<Self, SessionError> {
        fs::create_dir_all(&dir)
            .map_err(|e| SessionError::StoreIO(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { dir })
    }

    /// Path of an entry file.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read_entry(&self, key: &str) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::StoreIO(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn write_entry(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let target_path = self.entry_path(key);
        let temp_path = self.dir.join(format!("{}.tmp", key));

        fs::write(&temp_path, value)
            .map_err(|e| SessionError::StoreIO(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| SessionError::StoreIO(format!("Failed to rename {}: {}", key, e)))
    }

    fn remove_entry(&self, key: &str) -> Result<(), SessionError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::StoreIO(format!("Failed to delete {}: {}", key, e))),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredCredentials>, SessionError> {
        let token = self.read_entry(TOKEN_KEY)?;
        let user = self.read_entry(USER_KEY)?;

        if token.is_some() != user.is_some() {
            warn!("Found a lone credential entry, discarding it");
            self.clear()?;
            return Ok(None);
        }

        match assemble(token, user) {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable credentials");
                self.clear()?;
                Err(e)
            }
        }
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), SessionError> {
        let user = encode_user(&credentials.user)?;

        self.write_entry(TOKEN_KEY, &credentials.token)?;
        if let Err(e) = self.write_entry(USER_KEY, &user) {
            // Never leave a token without its user.
            let _ = self.remove_entry(TOKEN_KEY);
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let token = self.remove_entry(TOKEN_KEY);
        let user = self.remove_entry(USER_KEY);
        token.and(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::models::UserProfile;
    use tempfile::TempDir;

    fn make_credentials() -> StoredCredentials {
        StoredCredentials {
            token: "t1".to_string(),
            user: UserProfile::new("u-1", "a@x.com").with_name("Ada"),
        }
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        store.save(&make_credentials()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, make_credentials());
        assert!(store.entry_path(TOKEN_KEY).exists());
        assert!(store.entry_path(USER_KEY).exists());
    }

    #[test]
    fn test_file_store_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_clear_removes_both() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        store.save(&make_credentials()).unwrap();
        store.clear().unwrap();

        assert!(!store.entry_path(TOKEN_KEY).exists());
        assert!(!store.entry_path(USER_KEY).exists());
        assert!(store.load().unwrap().is_none());

        // Clearing again is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_lone_token_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        fs::write(store.entry_path(TOKEN_KEY), "orphan").unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(!store.entry_path(TOKEN_KEY).exists());
    }

    #[test]
    fn test_file_store_corrupt_user() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        fs::write(store.entry_path(TOKEN_KEY), "t1").unwrap();
        fs::write(store.entry_path(USER_KEY), "{broken").unwrap();

        assert!(matches!(store.load(), Err(SessionError::StoreCorrupt(_))));
        assert!(!store.entry_path(TOKEN_KEY).exists());
        assert!(!store.entry_path(USER_KEY).exists());
    }

    #[test]
    fn test_file_store_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        store.save(&make_credentials()).unwrap();

        let mut updated = make_credentials();
        updated.token = "t2".to_string();
        updated.user.has_license = true;
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), updated);
        assert!(!temp_dir.path().join("ss_auth_token.tmp").exists());
    }
}
