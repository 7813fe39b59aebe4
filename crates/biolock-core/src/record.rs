/// A ciphertext paired with the initialization vector that produced it.
///
/// The IV stored here must be the exact IV the cipher used at encryption
/// time; decrypting under any other IV fails the GCM integrity check rather
/// than yielding wrong plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    /// Nonce the cipher was initialized with.
    pub iv: Vec<u8>,
    /// Sealed payload, including the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedRecord {
    pub fn new(iv: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self { iv, ciphertext }
    }
}
