use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{IdentityError, Result, Storage};

pub const SESSION_KEY: &[u8] = b"chainbridge_auth";
pub const DEFAULT_CHAIN_ID: &str = "xion-testnet";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub address: String,
    #[serde(default)]
    pub chain_ids: Vec<String>,
}

/// The authenticated user, mirrored to storage.
///
/// `open` is the only read of the stored record; `login` saves it and
/// `logout` deletes it. Callers hold the store and pass it where needed.
pub struct SessionStore<S: Storage> {
    storage: S,
    user: Option<AuthUser>,
}

impl<S: Storage> SessionStore<S> {
    /// Load the stored user, if any. A record that no longer parses is
    /// dropped from storage instead of failing startup.
    pub fn open(mut storage: S) -> Result<Self> {
        let user = match storage.get(SESSION_KEY)? {
            Some(bytes) => match serde_json::from_slice::<AuthUser>(&bytes) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable stored session");
                    storage.delete(SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };
        Ok(Self { storage, user })
    }

    pub fn login(&mut self, address: &str) -> Result<AuthUser> {
        let address = address.trim();
        if address.is_empty() {
            return Err(IdentityError::EmptyAddress);
        }

        let user = AuthUser {
            address: address.to_string(),
            chain_ids: vec![DEFAULT_CHAIN_ID.to_string()],
        };
        self.storage.put(SESSION_KEY, &serde_json::to_vec(&user)?)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.storage.delete(SESSION_KEY)?;
        self.user = None;
        Ok(())
    }

    pub fn current(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStorage;

    #[test]
    fn test_login_persists_and_reopens() {
        let storage = InMemoryStorage::new();
        let mut store = SessionStore::open(storage.clone()).unwrap();
        assert!(!store.is_authenticated());

        let user = store.login("0xabc").unwrap();
        assert_eq!(user.chain_ids, vec![DEFAULT_CHAIN_ID.to_string()]);

        let reopened = SessionStore::open(storage).unwrap();
        assert_eq!(reopened.current(), Some(&user));
    }

    #[test]
    fn test_logout_deletes_record() {
        let storage = InMemoryStorage::new();
        let mut store = SessionStore::open(storage.clone()).unwrap();
        store.login("0xabc").unwrap();
        store.logout().unwrap();

        assert!(store.current().is_none());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_unreadable_record_is_discarded() {
        let mut storage = InMemoryStorage::new();
        storage.put(SESSION_KEY, b"{not json").unwrap();

        let store = SessionStore::open(storage.clone()).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_empty_address_rejected() {
        let mut store = SessionStore::open(InMemoryStorage::new()).unwrap();
        assert!(matches!(store.login("  "), Err(IdentityError::EmptyAddress)));
        assert!(!store.is_authenticated());
    }
}
