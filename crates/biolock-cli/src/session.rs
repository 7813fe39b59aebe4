use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use biolock_auth::{
    challenge::{AuthChallenge, AuthOutcome},
    sensor::{Availability, BiometricSensor, PromptSpec, SensorErrorCode},
};
use biolock_core::{prefs::PrefStore, slot::Slot};
use biolock_store::record_store::{EncryptedRecordStore, StoreError};
use biolock_vault::{
    cipher::CipherFactory,
    codec::{self, CodecError},
    key_store::{KeyError, KeyStore},
    vault::KeyVault,
};
use thiserror::Error;
use tracing::{debug, instrument};

/// How a user-triggered operation ended.
///
/// Auth-path outcomes are data, not errors: the caller decides whether to
/// re-prompt. Component failures (storage, codec, key backend) surface as
/// [`FlowError`] instead.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Operation finished; holds the user-visible result text (base64
    /// ciphertext on encrypt, recovered plaintext on decrypt).
    Completed(String),
    /// The sensor is not usable; the operation did not start.
    Unavailable(Availability),
    /// Wrong biometric; safe to re-prompt.
    AuthFailed { reason: String },
    /// Challenge-level error; check
    /// [`SensorErrorCode::requires_key_reset`] before retrying.
    AuthError {
        code: SensorErrorCode,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Wires the full flow: slot + operation in, key resolution, one biometric
/// challenge, the transform, and persistence.
///
/// One logical flow per operation; running two operations against the same
/// slot concurrently is a caller error and is not locked against.
pub struct Session<K: KeyStore, S: BiometricSensor, P: PrefStore> {
    vault: KeyVault<K>,
    sensor: Arc<S>,
    challenge: AuthChallenge<S>,
    records: EncryptedRecordStore<P>,
    prompt: PromptSpec,
}

impl<K: KeyStore, S: BiometricSensor, P: PrefStore> Session<K, S, P> {
    pub fn new(key_store: K, sensor: Arc<S>, prefs: P, prompt: PromptSpec) -> Self {
        Self {
            vault: KeyVault::new(key_store),
            challenge: AuthChallenge::new(Arc::clone(&sensor)),
            sensor,
            records: EncryptedRecordStore::new(prefs),
            prompt,
        }
    }

    pub fn availability(&self) -> Availability {
        self.sensor.check_availability()
    }

    /// Whether a slot currently holds a record (malformed still counts as
    /// present).
    pub async fn has_record(&self, slot: Slot) -> Result<bool, FlowError> {
        match self.records.load(slot).await {
            Ok(_) => Ok(true),
            Err(StoreError::RecordNotFound { .. }) => Ok(false),
            Err(StoreError::MalformedRecord { .. }) => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    /// Encrypt `plaintext` into `slot` behind one biometric challenge.
    ///
    /// Nothing is persisted unless the challenge succeeds and the transform
    /// completes; a prior record survives every failure path.
    #[instrument(skip_all, fields(slot = %slot))]
    pub async fn encrypt(&self, slot: Slot, plaintext: &str) -> Result<Outcome, FlowError> {
        let availability = self.availability();
        if !availability.is_available() {
            debug!(%availability, "sensor not usable, operation skipped");
            return Ok(Outcome::Unavailable(availability));
        }

        let key = self.vault.get_or_create_key(slot.key_name()).await?;
        let pending = CipherFactory::for_encryption(&key, None)?;

        match self.challenge.present(&self.prompt, pending).await {
            AuthOutcome::Authenticated(cipher) => {
                let record = codec::encrypt(plaintext, cipher)?;
                self.records.save(slot, &record).await?;
                Ok(Outcome::Completed(
                    general_purpose::STANDARD.encode(&record.ciphertext),
                ))
            }
            AuthOutcome::Failed { reason } => Ok(Outcome::AuthFailed { reason }),
            AuthOutcome::Error { code, message } => Ok(Outcome::AuthError { code, message }),
        }
    }

    /// Decrypt the record in `slot` behind one biometric challenge.
    ///
    /// The stored IV is what the decryption cipher gets bound to; a record
    /// that cannot be located or parsed fails before any prompt is shown.
    #[instrument(skip_all, fields(slot = %slot))]
    pub async fn decrypt(&self, slot: Slot) -> Result<Outcome, FlowError> {
        let availability = self.availability();
        if !availability.is_available() {
            debug!(%availability, "sensor not usable, operation skipped");
            return Ok(Outcome::Unavailable(availability));
        }

        let record = self.records.load(slot).await?;
        let key = self.vault.get_or_create_key(slot.key_name()).await?;
        let pending = CipherFactory::for_decryption(&key, record.iv.clone());

        match self.challenge.present(&self.prompt, pending).await {
            AuthOutcome::Authenticated(cipher) => {
                Ok(Outcome::Completed(codec::decrypt(&record, cipher)?))
            }
            AuthOutcome::Failed { reason } => Ok(Outcome::AuthFailed { reason }),
            AuthOutcome::Error { code, message } => Ok(Outcome::AuthError { code, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biolock_auth::sensor::{ApprovingSensor, ScriptedSensor, SensorReply};
    use biolock_core::prefs::InMemoryPrefStore;
    use biolock_vault::key_store::InMemoryKeyStore;

    fn prompt() -> PromptSpec {
        PromptSpec::new("Sign in")
    }

    fn approving_session(prefs: InMemoryPrefStore) -> Session<InMemoryKeyStore, ApprovingSensor, InMemoryPrefStore> {
        Session::new(
            InMemoryKeyStore::new(),
            Arc::new(ApprovingSensor),
            prefs,
            prompt(),
        )
    }

    #[tokio::test]
    async fn hello_round_trips_through_one_slot() {
        let prefs = InMemoryPrefStore::new();
        let session = approving_session(prefs.clone());

        let encrypted = session.encrypt(Slot::One, "hello").await.expect("encrypt");
        let Outcome::Completed(ciphertext_b64) = encrypted else {
            panic!("expected encryption to complete");
        };
        assert!(!ciphertext_b64.is_empty());

        // The persisted value is iv]ciphertext, with a non-empty iv and no
        // plaintext leakage.
        let raw = prefs
            .get(Slot::One.record_key())
            .await
            .expect("get")
            .expect("stored");
        let (iv_part, ct_part) = raw.split_once(']').expect("separator");
        assert!(!iv_part.is_empty());
        assert!(!ct_part.contains("hello"));

        let decrypted = session.decrypt(Slot::One).await.expect("decrypt");
        assert_eq!(decrypted, Outcome::Completed("hello".to_string()));
    }

    #[tokio::test]
    async fn slots_are_isolated_end_to_end() {
        let session = approving_session(InMemoryPrefStore::new());

        session.encrypt(Slot::One, "first").await.expect("encrypt");
        session.encrypt(Slot::Two, "second").await.expect("encrypt");

        assert_eq!(
            session.decrypt(Slot::One).await.expect("decrypt"),
            Outcome::Completed("first".to_string())
        );
        assert_eq!(
            session.decrypt(Slot::Two).await.expect("decrypt"),
            Outcome::Completed("second".to_string())
        );
    }

    #[tokio::test]
    async fn unavailable_sensor_is_a_no_op() {
        let prefs = InMemoryPrefStore::new();
        let sensor = Arc::new(ScriptedSensor::new(Availability::NoneEnrolled));
        let session = Session::new(InMemoryKeyStore::new(), sensor, prefs.clone(), prompt());

        let outcome = session.encrypt(Slot::One, "hello").await.expect("encrypt");
        assert_eq!(outcome, Outcome::Unavailable(Availability::NoneEnrolled));
        assert_eq!(prefs.get(Slot::One.record_key()).await.expect("get"), None);
    }

    #[tokio::test]
    async fn failed_auth_leaves_prior_record_untouched() {
        let prefs = InMemoryPrefStore::new();
        let sensor = Arc::new(ScriptedSensor::new(Availability::Available));
        sensor.push_reply(SensorReply::Success);
        sensor.push_reply(SensorReply::Failure {
            reason: "no match".into(),
        });
        sensor.push_reply(SensorReply::Success);
        let session = Session::new(
            InMemoryKeyStore::new(),
            Arc::clone(&sensor),
            prefs.clone(),
            prompt(),
        );

        session.encrypt(Slot::One, "original").await.expect("encrypt");
        let stored = prefs.get(Slot::One.record_key()).await.expect("get");

        let outcome = session
            .encrypt(Slot::One, "replacement")
            .await
            .expect("encrypt");
        assert!(matches!(outcome, Outcome::AuthFailed { .. }));
        assert_eq!(prefs.get(Slot::One.record_key()).await.expect("get"), stored);

        // The surviving record still decrypts to the original text.
        assert_eq!(
            session.decrypt(Slot::One).await.expect("decrypt"),
            Outcome::Completed("original".to_string())
        );
    }

    #[tokio::test]
    async fn each_operation_consumes_its_own_challenge() {
        let sensor = Arc::new(ScriptedSensor::new(Availability::Available));
        sensor.push_reply(SensorReply::Success);
        let session = Session::new(
            InMemoryKeyStore::new(),
            Arc::clone(&sensor),
            InMemoryPrefStore::new(),
            prompt(),
        );

        session.encrypt(Slot::One, "hello").await.expect("encrypt");

        // The one scripted authorization is spent; the next operation must
        // fail its own challenge rather than ride the previous one.
        let outcome = session.decrypt(Slot::One).await.expect("decrypt");
        assert!(matches!(
            outcome,
            Outcome::AuthError {
                code: SensorErrorCode::HardwareError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn terminal_error_codes_reach_the_caller() {
        let sensor = Arc::new(ScriptedSensor::new(Availability::Available));
        sensor.push_reply(SensorReply::Error {
            code: SensorErrorCode::KeyInvalidated,
            message: "enrollment changed".into(),
        });
        let session = Session::new(
            InMemoryKeyStore::new(),
            sensor,
            InMemoryPrefStore::new(),
            prompt(),
        );

        let outcome = session.encrypt(Slot::One, "hello").await.expect("encrypt");
        let Outcome::AuthError { code, .. } = outcome else {
            panic!("expected an auth error");
        };
        assert!(code.requires_key_reset());
    }

    #[tokio::test]
    async fn decrypting_an_empty_slot_reports_not_found() {
        let session = approving_session(InMemoryPrefStore::new());

        let err = session.decrypt(Slot::Two).await.expect_err("empty slot");
        assert!(matches!(
            err,
            FlowError::Store(StoreError::RecordNotFound { slot: Slot::Two })
        ));
    }

    #[tokio::test]
    async fn has_record_tracks_slot_contents() {
        let session = approving_session(InMemoryPrefStore::new());

        assert!(!session.has_record(Slot::One).await.expect("check"));
        session.encrypt(Slot::One, "hello").await.expect("encrypt");
        assert!(session.has_record(Slot::One).await.expect("check"));
        assert!(!session.has_record(Slot::Two).await.expect("check"));
    }
}
