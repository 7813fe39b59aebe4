//! Persisted record wire format: `<base64(iv)>]<base64(ciphertext)>`.
//!
//! Both fields are standard-alphabet base64 without line wrapping, so the
//! literal `]` can never occur inside either half.

use base64::{engine::general_purpose, Engine as _};
use biolock_core::record::EncryptedRecord;

pub(crate) const SEPARATOR: char = ']';

pub(crate) fn encode(record: &EncryptedRecord) -> String {
    format!(
        "{}{SEPARATOR}{}",
        general_purpose::STANDARD.encode(&record.iv),
        general_purpose::STANDARD.encode(&record.ciphertext)
    )
}

/// Split on the first separator and decode both halves.
pub(crate) fn decode(raw: &str) -> Result<EncryptedRecord, String> {
    let (iv_part, ciphertext_part) = raw
        .split_once(SEPARATOR)
        .ok_or_else(|| format!("missing `{SEPARATOR}` separator"))?;

    let iv = general_purpose::STANDARD
        .decode(iv_part)
        .map_err(|e| format!("iv decode failed: {e}"))?;
    let ciphertext = general_purpose::STANDARD
        .decode(ciphertext_part)
        .map_err(|e| format!("ciphertext decode failed: {e}"))?;

    Ok(EncryptedRecord::new(iv, ciphertext))
}
