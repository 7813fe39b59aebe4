use std::sync::Arc;

use biolock_vault::cipher::{AuthorizedCipher, PendingCipher};
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use crate::sensor::{BiometricSensor, PromptSpec, SensorErrorCode, SensorReply};

/// How one challenge resolved. Produced exactly once per `present` call;
/// never retried automatically.
pub enum AuthOutcome {
    /// The sensor matched; the cipher is cleared for one transform.
    Authenticated(AuthorizedCipher),
    /// Wrong biometric; the caller may re-prompt with a fresh cipher.
    Failed { reason: String },
    /// Challenge-level error; check
    /// [`SensorErrorCode::requires_key_reset`] before retrying.
    Error {
        code: SensorErrorCode,
        message: String,
    },
}

/// Presents a challenge to the user and pairs its single resolution with
/// the pending cipher handed in.
///
/// This is the flow's only suspension point: control passes to the
/// user-paced platform dialog and resumes on its one callback.
pub struct AuthChallenge<S: BiometricSensor> {
    sensor: Arc<S>,
}

impl<S: BiometricSensor> AuthChallenge<S> {
    pub fn new(sensor: Arc<S>) -> Self {
        Self { sensor }
    }

    /// Present `prompt` and suspend until the sensor resolves.
    ///
    /// On anything but success the pending cipher is dropped unauthorized;
    /// no state is mutated.
    #[instrument(skip_all, fields(title = %prompt.title))]
    pub async fn present(&self, prompt: &PromptSpec, pending: PendingCipher) -> AuthOutcome {
        let (tx, rx) = oneshot::channel();
        self.sensor.authenticate(prompt, tx);
        resolve(rx.await, pending)
    }

    /// Like [`AuthChallenge::present`], but the caller keeps a cancellation
    /// signal (e.g. for teardown). Cancelling yields an
    /// [`AuthOutcome::Error`] with [`SensorErrorCode::Canceled`] and
    /// discards the cipher.
    #[instrument(skip_all, fields(title = %prompt.title))]
    pub async fn present_cancellable(
        &self,
        prompt: &PromptSpec,
        pending: PendingCipher,
        cancel: oneshot::Receiver<()>,
    ) -> AuthOutcome {
        let (tx, rx) = oneshot::channel();
        self.sensor.authenticate(prompt, tx);

        let cancelled = async move {
            // A dropped cancel handle means the caller can no longer
            // cancel, not that it did.
            if cancel.await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            reply = rx => resolve(reply, pending),
            () = cancelled => {
                debug!("challenge cancelled by caller");
                AuthOutcome::Error {
                    code: SensorErrorCode::Canceled,
                    message: "challenge cancelled by caller".to_string(),
                }
            }
        }
    }
}

fn resolve(
    reply: Result<SensorReply, oneshot::error::RecvError>,
    pending: PendingCipher,
) -> AuthOutcome {
    match reply {
        Ok(SensorReply::Success) => AuthOutcome::Authenticated(pending.into_authorized()),
        Ok(SensorReply::Failure { reason }) => AuthOutcome::Failed { reason },
        Ok(SensorReply::Error { code, message }) => AuthOutcome::Error { code, message },
        Err(_) => AuthOutcome::Error {
            code: SensorErrorCode::HardwareError,
            message: "sensor dropped the challenge without replying".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{ApprovingSensor, Availability, ScriptedSensor, SilentSensor};
    use biolock_vault::{
        cipher::CipherFactory,
        codec,
        key_store::{InMemoryKeyStore, KeySpec, KeyStore},
    };

    async fn pending_cipher() -> PendingCipher {
        let store = InMemoryKeyStore::new();
        let key = store
            .generate_key("k", &KeySpec::default())
            .await
            .expect("key");
        CipherFactory::for_encryption(&key, None).expect("cipher")
    }

    fn prompt() -> PromptSpec {
        PromptSpec::new("Confirm your identity")
    }

    #[tokio::test]
    async fn success_hands_back_a_usable_cipher() {
        let challenge = AuthChallenge::new(Arc::new(ApprovingSensor));
        let outcome = challenge.present(&prompt(), pending_cipher().await).await;

        let AuthOutcome::Authenticated(cipher) = outcome else {
            panic!("expected authentication to succeed");
        };
        let record = codec::encrypt("hi", cipher).expect("encrypt");
        assert!(!record.ciphertext.is_empty());
    }

    #[tokio::test]
    async fn failure_resolves_without_authorizing() {
        let sensor = ScriptedSensor::new(Availability::Available);
        sensor.push_reply(SensorReply::Failure {
            reason: "no match".into(),
        });
        let challenge = AuthChallenge::new(Arc::new(sensor));

        let outcome = challenge.present(&prompt(), pending_cipher().await).await;
        assert!(matches!(outcome, AuthOutcome::Failed { reason } if reason == "no match"));
    }

    #[tokio::test]
    async fn sensor_error_codes_pass_through() {
        let sensor = ScriptedSensor::new(Availability::Available);
        sensor.push_reply(SensorReply::Error {
            code: SensorErrorCode::KeyInvalidated,
            message: "enrollment changed".into(),
        });
        let challenge = AuthChallenge::new(Arc::new(sensor));

        let outcome = challenge.present(&prompt(), pending_cipher().await).await;
        let AuthOutcome::Error { code, .. } = outcome else {
            panic!("expected an error outcome");
        };
        assert!(code.requires_key_reset());
    }

    #[tokio::test]
    async fn dead_sensor_surfaces_as_hardware_error() {
        // Dry script: the sensor drops the reply channel unresolved.
        let sensor = ScriptedSensor::new(Availability::Available);
        let challenge = AuthChallenge::new(Arc::new(sensor));

        let outcome = challenge.present(&prompt(), pending_cipher().await).await;
        assert!(matches!(
            outcome,
            AuthOutcome::Error {
                code: SensorErrorCode::HardwareError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancel_signal_resolves_the_challenge() {
        // The sensor parks the challenge forever; only cancel can end it.
        let challenge = AuthChallenge::new(Arc::new(SilentSensor::new()));

        let (cancel_tx, cancel_rx) = oneshot::channel();
        cancel_tx.send(()).expect("receiver alive");

        let outcome = challenge
            .present_cancellable(&prompt(), pending_cipher().await, cancel_rx)
            .await;
        assert!(matches!(
            outcome,
            AuthOutcome::Error {
                code: SensorErrorCode::Canceled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dropped_cancel_handle_does_not_cancel() {
        let sensor = ScriptedSensor::new(Availability::Available);
        sensor.push_reply(SensorReply::Success);
        let challenge = AuthChallenge::new(Arc::new(sensor));

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        drop(cancel_tx);

        let outcome = challenge
            .present_cancellable(&prompt(), pending_cipher().await, cancel_rx)
            .await;
        assert!(matches!(outcome, AuthOutcome::Authenticated(_)));
    }
}
