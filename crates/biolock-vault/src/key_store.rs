use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 256-bit key length.
pub(crate) const KEY_LEN: usize = 32;

/// Opaque handle to a named symmetric key.
///
/// The raw bytes are private to this crate; the rest of the application only
/// ever sees the name.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    name: String,
    bytes: [u8; KEY_LEN],
}

impl SecretKey {
    pub(crate) fn new(name: impl Into<String>, bytes: [u8; KEY_LEN]) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log key bytes.
        f.debug_struct("SecretKey")
            .field("name", &self.name)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

/// Cipher algorithm a key is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Aes256Gcm,
}

/// Policy attached to generated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub algorithm: Algorithm,
    /// Every use of the key must be gated by a fresh successful
    /// authentication; unlocked state is never cached across operations.
    pub auth_required_per_use: bool,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes256Gcm,
            auth_required_per_use: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("secure key storage unavailable: {reason}")]
    StorageUnavailable { reason: String },
    #[error("stored key material is corrupt: {reason}")]
    CorruptKey { reason: String },
    #[error("suggested IV must be {expected} bytes, got {got}")]
    InvalidIv { expected: usize, got: usize },
}

/// Secure key storage capability (OS keyring in production; memory in tests).
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Look up an existing key by name. Absence is not an error.
    async fn get_key(&self, name: &str) -> Result<Option<SecretKey>, KeyError>;

    /// Generate and persist a new key under `name` with the given policy.
    async fn generate_key(&self, name: &str, spec: &KeySpec) -> Result<SecretKey, KeyError>;
}

/// OS keyring-backed store. Each key name maps to one keyring entry under a
/// shared service label. The keyring holds material only; the per-use
/// authentication policy is enforced by the challenge layer.
pub struct KeyringKeyStore {
    service: String,
}

impl KeyringKeyStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry, KeyError> {
        keyring::Entry::new(&self.service, name).map_err(|err| KeyError::StorageUnavailable {
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl KeyStore for KeyringKeyStore {
    async fn get_key(&self, name: &str) -> Result<Option<SecretKey>, KeyError> {
        // Keyring operations are synchronous; wrap in async for trait
        // compatibility.
        match self.entry(name)?.get_password() {
            Ok(secret) => decode_key(name, &secret).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(KeyError::StorageUnavailable {
                reason: err.to_string(),
            }),
        }
    }

    async fn generate_key(&self, name: &str, _spec: &KeySpec) -> Result<SecretKey, KeyError> {
        let material = generate_material(name);
        self.entry(name)?
            .set_password(&encode_key(&material))
            .map_err(|err| KeyError::StorageUnavailable {
                reason: err.to_string(),
            })?;
        Ok(material)
    }
}

/// In-memory key store for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyStore {
    inner: Arc<Mutex<HashMap<String, SecretKey>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn get_key(&self, name: &str) -> Result<Option<SecretKey>, KeyError> {
        let map = self
            .inner
            .lock()
            .map_err(|err| KeyError::StorageUnavailable {
                reason: format!("lock poisoned: {err}"),
            })?;
        Ok(map.get(name).cloned())
    }

    async fn generate_key(&self, name: &str, _spec: &KeySpec) -> Result<SecretKey, KeyError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|err| KeyError::StorageUnavailable {
                reason: format!("lock poisoned: {err}"),
            })?;
        let material = generate_material(name);
        map.insert(name.to_string(), material.clone());
        Ok(material)
    }
}

fn generate_material(name: &str) -> SecretKey {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    SecretKey::new(name, bytes)
}

fn encode_key(key: &SecretKey) -> String {
    general_purpose::STANDARD.encode(key.bytes())
}

fn decode_key(name: &str, secret: &str) -> Result<SecretKey, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| KeyError::CorruptKey {
            reason: e.to_string(),
        })?;

    if bytes.len() != KEY_LEN {
        return Err(KeyError::CorruptKey {
            reason: format!("expected {KEY_LEN} bytes, got {}", bytes.len()),
        });
    }

    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(&bytes);
    Ok(SecretKey::new(name, out))
}
