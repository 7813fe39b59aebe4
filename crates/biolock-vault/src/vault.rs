use tracing::{debug, instrument};

use crate::key_store::{KeyError, KeySpec, KeyStore, SecretKey};

/// Owns the key material lifecycle: resolves a named key from secure
/// storage, generating it on first use.
pub struct KeyVault<K: KeyStore> {
    store: K,
}

impl<K: KeyStore> KeyVault<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Return the key stored under `name`, creating it if absent.
    ///
    /// New keys are AES-256-GCM with authentication required for every use.
    /// A backend failure is fatal for the operation and is not retried.
    #[instrument(skip(self))]
    pub async fn get_or_create_key(&self, name: &str) -> Result<SecretKey, KeyError> {
        if let Some(key) = self.store.get_key(name).await? {
            return Ok(key);
        }

        debug!("no key under this name yet, generating");
        self.store.generate_key(name, &KeySpec::default()).await
    }
}
