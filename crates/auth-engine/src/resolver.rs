//! Current-user resolver.

use crate::{AuthAuthority, ResolveError, UserRecord};
use std::sync::Arc;
use tracing::warn;
use tracker_storage::SessionStore;

/// Asks the auth authority who holds the stored credential.
///
/// Each call is a single round trip; retry policy belongs to the caller.
pub struct CurrentUserResolver {
    store: Arc<SessionStore>,
    authority: Arc<dyn AuthAuthority>,
}

impl CurrentUserResolver {
    pub fn new(store: Arc<SessionStore>, authority: Arc<dyn AuthAuthority>) -> Self {
        Self { store, authority }
    }

    /// Stored credential. An unreadable store counts as no credential.
    fn credential(&self) -> Option<String> {
        match self.store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Session store unreadable, resolving without credential");
                None
            }
        }
    }

    pub async fn get_current_user(&self) -> Result<UserRecord, ResolveError> {
        let credential = self.credential();
        self.authority.current_user(credential.as_deref()).await
    }

    /// Remote half of logout.
    pub async fn logout(&self) -> Result<(), ResolveError> {
        let credential = self.credential();
        self.authority.logout(credential.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::harness::{user, MockAuthority};
    use tracker_storage::{FileStorage, MemoryStorage};

    #[tokio::test]
    async fn test_attaches_stored_credential() {
        let store = Arc::new(SessionStore::new(Box::new(MemoryStorage::new())));
        store.save("tok123").unwrap();
        let authority = Arc::new(MockAuthority::new());
        authority.push_user(user("Ann", "a@x.com"));

        let resolver = CurrentUserResolver::new(store, authority.clone());
        let resolved = resolver.get_current_user().await.unwrap();

        assert_eq!(resolved.name, "Ann");
        assert_eq!(authority.credentials_seen(), vec![Some("tok123".to_string())]);
    }

    #[tokio::test]
    async fn test_absent_credential_is_sent_as_none() {
        let store = Arc::new(SessionStore::new(Box::new(MemoryStorage::new())));
        let authority = Arc::new(MockAuthority::new());
        authority.push_failure(ResolveError::Unauthorized);

        let resolver = CurrentUserResolver::new(store, authority.clone());
        let err = resolver.get_current_user().await.unwrap_err();

        assert_eq!(err, ResolveError::Unauthorized);
        assert_eq!(authority.credentials_seen(), vec![None]);
    }

    #[tokio::test]
    async fn test_corrupt_store_resolves_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{broken").unwrap();

        let store = Arc::new(SessionStore::new(Box::new(FileStorage::new(&path))));
        let authority = Arc::new(MockAuthority::new());
        authority.push_failure(ResolveError::Unauthorized);

        let resolver = CurrentUserResolver::new(store, authority.clone());
        assert!(resolver.get_current_user().await.is_err());
        assert_eq!(authority.credentials_seen(), vec![None]);
    }
}
