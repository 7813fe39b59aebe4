//! Key lifecycle and cipher binding for Biolock.
//!
//! Secret key bytes never leave this crate: the [`key_store`] backends hand
//! out opaque [`key_store::SecretKey`] handles, [`cipher::CipherFactory`]
//! turns a handle into an unauthorized cipher, and only an
//! [`cipher::AuthorizedCipher`] (granted by a successful biometric
//! challenge) can run the [`codec`] transforms, exactly once.

pub mod cipher;
pub mod codec;
pub mod key_store;
pub mod vault;
