//! Network participant identities.
//!
//! An [`Identity`] is the opaque address of a consumer or provider on the
//! Peerlink network. The connection manager passes identities through to its
//! collaborators unchanged; how they are derived (keystore accounts, hex
//! addresses) is a backend concern hidden behind the [`Keystore`] trait.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Opaque identifier of a network participant.
///
/// Compared by value, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from its string form.
    pub fn new(address: impl Into<String>) -> Self {
        Identity(address.into())
    }

    /// String form of the identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity carries no address at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// Errors from identity storage backends.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The keystore failed to create or enumerate accounts
    #[error("keystore error: {0}")]
    Keystore(String),
}

/// Storage backend holding the identities available to this node.
pub trait Keystore: Send + Sync {
    /// Create a new account protected by the given passphrase.
    fn new_account(&self, passphrase: &str) -> Result<Identity, IdentityError>;

    /// All accounts currently held by the backend.
    fn accounts(&self) -> Vec<Identity>;
}

/// Lookup and creation of local identities over a [`Keystore`].
pub struct IdentityManager {
    keystore: Arc<dyn Keystore>,
}

impl IdentityManager {
    /// Create a manager over the given keystore.
    pub fn new(keystore: Arc<dyn Keystore>) -> Self {
        IdentityManager { keystore }
    }

    /// Create a new identity protected by the given passphrase.
    pub fn create_identity(&self, passphrase: &str) -> Result<Identity, IdentityError> {
        self.keystore.new_account(passphrase)
    }

    /// All identities held locally.
    pub fn identities(&self) -> Vec<Identity> {
        self.keystore.accounts()
    }

    /// Look up a local identity by address, case-insensitively.
    pub fn get_identity(&self, address: &str) -> Option<Identity> {
        let wanted = address.to_lowercase();
        self.identities()
            .into_iter()
            .find(|id| id.as_str().to_lowercase() == wanted)
    }

    /// Whether the given address belongs to a locally held identity.
    pub fn has_identity(&self, address: &str) -> bool {
        self.get_identity(address).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MemoryKeystore {
        accounts: Mutex<Vec<Identity>>,
    }

    impl MemoryKeystore {
        fn new() -> Self {
            MemoryKeystore {
                accounts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Keystore for MemoryKeystore {
        fn new_account(&self, _passphrase: &str) -> Result<Identity, IdentityError> {
            let mut accounts = self.accounts.lock().unwrap();
            let id = Identity::new(format!("0xAccount{}", accounts.len()));
            accounts.push(id.clone());
            Ok(id)
        }

        fn accounts(&self) -> Vec<Identity> {
            self.accounts.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_identity_equality_and_display() {
        let a = Identity::from("0xABC");
        let b = Identity::new("0xABC");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0xABC");
        assert!(!a.is_empty());
        assert!(Identity::from("").is_empty());
    }

    #[test]
    fn test_create_and_list_identities() {
        let manager = IdentityManager::new(Arc::new(MemoryKeystore::new()));
        assert!(manager.identities().is_empty());

        let id = manager.create_identity("secret").unwrap();
        assert_eq!(manager.identities(), vec![id]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let manager = IdentityManager::new(Arc::new(MemoryKeystore::new()));
        let id = manager.create_identity("secret").unwrap();

        let found = manager.get_identity(&id.as_str().to_uppercase());
        assert_eq!(found, Some(id));
        assert!(!manager.has_identity("0xMissing"));
    }
}
