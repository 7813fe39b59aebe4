use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::{
    codec::CodecError,
    key_store::{KeyError, SecretKey},
};

/// GCM nonce length in bytes.
pub const IV_LEN: usize = 12;

#[derive(Debug)]
enum Mode {
    Encrypt { iv: [u8; IV_LEN] },
    Decrypt { iv: Vec<u8> },
}

impl Mode {
    fn iv(&self) -> &[u8] {
        match self {
            Mode::Encrypt { iv } => iv,
            Mode::Decrypt { iv } => iv,
        }
    }
}

/// Builds cipher instances bound to a key and a direction.
///
/// The result is always a [`PendingCipher`]: unusable for the actual
/// transform until a successful biometric challenge promotes it.
pub struct CipherFactory;

impl CipherFactory {
    /// Cipher for encryption. A caller-suggested IV is honored verbatim
    /// (this is what makes deterministic tests possible); `None` draws a
    /// fresh random nonce. A suggestion of the wrong length is rejected
    /// here rather than silently replaced.
    pub fn for_encryption(
        key: &SecretKey,
        suggested_iv: Option<&[u8]>,
    ) -> Result<PendingCipher, KeyError> {
        let iv = match suggested_iv {
            Some(bytes) => bytes.try_into().map_err(|_| KeyError::InvalidIv {
                expected: IV_LEN,
                got: bytes.len(),
            })?,
            None => Aes256Gcm::generate_nonce(&mut OsRng).into(),
        };

        Ok(PendingCipher {
            cipher: build(key),
            mode: Mode::Encrypt { iv },
        })
    }

    /// Cipher for decryption, bound to the IV stored with the record.
    ///
    /// A wrong or malformed IV is accepted here; it surfaces as
    /// [`CodecError::DecryptionFailed`] at use time, never as wrong
    /// plaintext.
    pub fn for_decryption(key: &SecretKey, iv: Vec<u8>) -> PendingCipher {
        PendingCipher {
            cipher: build(key),
            mode: Mode::Decrypt { iv },
        }
    }
}

fn build(key: &SecretKey) -> Aes256Gcm {
    Aes256Gcm::new(key.bytes().into())
}

/// A configured but not yet authorized cipher.
///
/// Holds key + direction + IV, but exposes no transform. The challenge
/// layer calls [`PendingCipher::into_authorized`] after the sensor reports
/// success; a challenge that fails or is cancelled simply drops the handle.
pub struct PendingCipher {
    cipher: Aes256Gcm,
    mode: Mode,
}

impl std::fmt::Debug for PendingCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCipher")
            .field("mode", &self.mode)
            .finish()
    }
}

impl PendingCipher {
    /// IV this cipher is bound to.
    pub fn iv(&self) -> &[u8] {
        self.mode.iv()
    }

    /// Promote to a usable cipher. Must only be called on the strength of a
    /// successful biometric challenge.
    pub fn into_authorized(self) -> AuthorizedCipher {
        AuthorizedCipher {
            cipher: self.cipher,
            mode: self.mode,
        }
    }
}

/// A cipher cleared for exactly one transform.
///
/// Both transforms take `self` by value, so a handle cannot be used twice;
/// a second operation needs a fresh challenge.
pub struct AuthorizedCipher {
    cipher: Aes256Gcm,
    mode: Mode,
}

impl AuthorizedCipher {
    /// IV this cipher is bound to.
    pub fn iv(&self) -> &[u8] {
        self.mode.iv()
    }

    pub(crate) fn seal(self, plaintext: &[u8]) -> Result<([u8; IV_LEN], Vec<u8>), CodecError> {
        let Mode::Encrypt { iv } = self.mode else {
            return Err(CodecError::WrongMode);
        };
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|e| CodecError::EncryptionFailed {
                reason: e.to_string(),
            })?;
        Ok((iv, ciphertext))
    }

    pub(crate) fn open(self, ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let Mode::Decrypt { iv } = self.mode else {
            return Err(CodecError::WrongMode);
        };
        if iv.len() != IV_LEN {
            return Err(CodecError::DecryptionFailed);
        }
        self.cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext)
            .map_err(|_| CodecError::DecryptionFailed)
    }
}
