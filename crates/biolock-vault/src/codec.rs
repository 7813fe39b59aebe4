use biolock_core::record::EncryptedRecord;
use thiserror::Error;

use crate::cipher::AuthorizedCipher;

/// Errors from the encrypt/decrypt transforms.
///
/// `DecryptionFailed` deliberately carries no detail: an integrity failure
/// must not reveal whether the key, the IV, or the ciphertext was wrong,
/// and partial plaintext is never returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("decryption failed: integrity check rejected the record")]
    DecryptionFailed,
    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },
    #[error("cipher direction does not match the requested transform")]
    WrongMode,
}

/// Encrypt `plaintext` (UTF-8) under an authorized cipher.
///
/// The IV in the returned record is read back from the cipher itself, so
/// record and cipher can never disagree about which nonce was used.
pub fn encrypt(plaintext: &str, cipher: AuthorizedCipher) -> Result<EncryptedRecord, CodecError> {
    let (iv, ciphertext) = cipher.seal(plaintext.as_bytes())?;
    Ok(EncryptedRecord::new(iv.to_vec(), ciphertext))
}

/// Decrypt a record under an authorized cipher bound to the record's IV.
pub fn decrypt(record: &EncryptedRecord, cipher: AuthorizedCipher) -> Result<String, CodecError> {
    if cipher.iv() != record.iv.as_slice() {
        return Err(CodecError::DecryptionFailed);
    }
    let plaintext = cipher.open(&record.ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| CodecError::DecryptionFailed)
}
