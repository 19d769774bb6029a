//! Persisted session credential.

use crate::{KeyValueStorage, StorageKeys, StorageResult};

/// Holds the opaque bearer credential across restarts.
///
/// No expiry is tracked here; the remote authority decides whether a
/// credential is still valid.
pub struct SessionStore {
    storage: Box<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Store the credential, replacing any previous one.
    pub fn save(&self, credential: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::SESSION_TOKEN, credential)
    }

    /// Load the stored credential, if any.
    pub fn load(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::SESSION_TOKEN)
    }

    /// Remove the credential. Clearing an empty store is not an error.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SESSION_TOKEN)?;
        Ok(())
    }

    pub fn has_credential(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::SESSION_TOKEN)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
