use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use biolock_core::{
    prefs::{PrefStore, PrefStoreError},
    record::EncryptedRecord,
    slot::Slot,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::wire;

/// Errors produced by the record store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing was ever saved for this slot.
    #[error("no record stored for slot {slot}")]
    RecordNotFound { slot: Slot },
    /// A value exists but cannot be parsed back into a record.
    #[error("stored record for slot {slot} is malformed: {reason}")]
    MalformedRecord { slot: Slot, reason: String },
    /// Underlying preference backend failure.
    #[error("preference backend failure: {reason}")]
    Backend { reason: String },
}

impl From<PrefStoreError> for StoreError {
    fn from(err: PrefStoreError) -> Self {
        match err {
            PrefStoreError::Backend { reason } => StoreError::Backend { reason },
        }
    }
}

/// Slot-addressed persistence for encrypted records, backed by any
/// [`PrefStore`].
pub struct EncryptedRecordStore<P: PrefStore> {
    prefs: Arc<P>,
}

impl<P: PrefStore> EncryptedRecordStore<P> {
    pub fn new(prefs: P) -> Self {
        Self {
            prefs: Arc::new(prefs),
        }
    }

    /// Serialize and persist a record under the slot's preference key,
    /// replacing any previous record for that slot.
    #[instrument(skip_all, fields(slot = %slot))]
    pub async fn save(&self, slot: Slot, record: &EncryptedRecord) -> Result<(), StoreError> {
        debug!(
            iv = %general_purpose::STANDARD.encode(&record.iv),
            "storing record"
        );
        self.prefs
            .put(slot.record_key(), &wire::encode(record))
            .await?;
        Ok(())
    }

    /// Read back the record for a slot.
    #[instrument(skip_all, fields(slot = %slot))]
    pub async fn load(&self, slot: Slot) -> Result<EncryptedRecord, StoreError> {
        let raw = self
            .prefs
            .get(slot.record_key())
            .await?
            .ok_or(StoreError::RecordNotFound { slot })?;
        wire::decode(&raw).map_err(|reason| StoreError::MalformedRecord { slot, reason })
    }
}
