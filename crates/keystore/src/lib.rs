//! OAuth token persistence for the gisto application.
//!
//! This crate owns the single OAuth token: it is written after a successful
//! login, attached to authenticated requests, and cleared whenever the
//! remote service answers 401. The token lives in the platform secret
//! store (Keychain, Secret Service, Credential Manager) via the `keyring`
//! crate; an in-memory backend exists so tests never touch real
//! credentials.
//!
//! The store keeps no in-memory copy of the token. Every read and write
//! goes to the backend, so a clear performed by one code path (say, the
//! 401 handler) is immediately visible to every other holder of a cloned
//! store.
//!
//! # Examples
//!
//! ```
//! use gisto_keystore::TokenStore;
//! use secrecy::ExposeSecret;
//!
//! let store = TokenStore::in_memory();
//! assert!(!store.has_token());
//!
//! store.set(Some("abc123")).unwrap();
//! assert!(store.has_token());
//! assert_eq!(store.get().unwrap().expose_secret(), "abc123");
//!
//! store.set(None).unwrap();
//! assert!(store.get().is_none());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;
use tracing::{debug, warn};

/// The secret-store service name under which entries are filed.
const SERVICE: &str = "gisto";

/// The account the OAuth token is scoped to.
const GITHUB_ACCOUNT: &str = "github";

/// Errors that can occur while talking to the secret store.
#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    /// The platform secret store rejected an operation.
    #[error("secret store error: {message}")]
    Backend {
        /// Description of the underlying failure.
        message: String,
    },
}

/// A specialized Result type for keystore operations.
pub type Result<T> = std::result::Result<T, KeystoreError>;

impl From<keyring::Error> for KeystoreError {
    fn from(err: keyring::Error) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Minimal secret-store surface the token store is built on.
///
/// A missing entry is `Ok(None)` from `retrieve` and a no-op for `delete`;
/// only genuine store failures surface as errors.
pub trait SecretBackend: Send + Sync {
    /// Writes or overwrites the secret under `account`.
    fn store(&self, account: &str, value: &str) -> Result<()>;
    /// Reads the secret under `account`, or `None` if absent.
    fn retrieve(&self, account: &str) -> Result<Option<String>>;
    /// Removes the secret under `account` if present.
    fn delete(&self, account: &str) -> Result<()>;
}

/// Backend over the platform secret store.
struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, account)?)
    }
}

impl SecretBackend for KeyringBackend {
    fn store(&self, account: &str, value: &str) -> Result<()> {
        Ok(self.entry(account)?.set_password(value)?)
    }

    fn retrieve(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory backend for tests and environments without a secret store.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl SecretBackend for MemoryBackend {
    fn store(&self, account: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.to_string(), value.to_string());
        Ok(())
    }

    fn retrieve(&self, account: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account)
            .cloned())
    }

    fn delete(&self, account: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(account);
        Ok(())
    }
}

/// Persists the OAuth token in a secret store.
///
/// Clones share the same backend, so the API client and the OAuth flow can
/// each hold a handle and still observe one consistent token.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn SecretBackend>,
    account: String,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a store over the platform secret store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(Arc::new(KeyringBackend {
            service: SERVICE.to_string(),
        }))
    }

    /// Creates a store over an in-memory backend.
    ///
    /// Intended for tests; nothing is persisted across processes.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::default()))
    }

    /// Creates a store over a custom backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn SecretBackend>) -> Self {
        Self {
            backend,
            account: GITHUB_ACCOUNT.to_string(),
        }
    }

    /// Returns the current token, or `None` when logged out.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        match self.backend.retrieve(&self.account) {
            Ok(value) => value.map(SecretString::from),
            Err(err) => {
                warn!(error = %err, "failed to read token from secret store");
                None
            }
        }
    }

    /// Writes, overwrites, or clears the token.
    ///
    /// `None` clears the persisted entry. If a write fails the entry is
    /// cleared so the store never holds a partially written token.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret store rejects the write; the entry
    /// has already been cleared when that happens.
    pub fn set(&self, token: Option<&str>) -> Result<()> {
        match token {
            Some(value) => {
                if let Err(err) = self.backend.store(&self.account, value) {
                    warn!(error = %err, "token write failed, clearing entry");
                    self.backend.delete(&self.account).ok();
                    return Err(err);
                }
                debug!("token stored");
                Ok(())
            }
            None => self.clear(),
        }
    }

    /// Removes the token, returning the store to the logged-out state.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret store rejects the delete.
    pub fn clear(&self) -> Result<()> {
        debug!("clearing token");
        self.backend.delete(&self.account)
    }

    /// Returns `true` iff a non-empty token is present.
    #[must_use]
    pub fn has_token(&self) -> bool {
        use secrecy::ExposeSecret;
        self.get()
            .is_some_and(|token| !token.expose_secret().is_empty())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
