use std::{path::PathBuf, sync::Arc};

use biolock_auth::sensor::ApprovingSensor;
use biolock_store::json_prefs::JsonFilePrefs;
use biolock_vault::key_store::KeyringKeyStore;
use color_eyre::Result;
use dirs::data_dir;
use tracing::{debug, warn};

use crate::{config, config::Config, session::Session};

const DEFAULT_KEYRING_SERVICE: &str = "biolock";

/// Resolve the default records file.
pub fn default_prefs_path() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("biolock").join("records.json"))
}

/// Build a session from config: OS keyring for keys, JSON file for records.
///
/// There is no portable biometric service to talk to from a terminal, so
/// the sensor seam is filled with the approving stub; a platform port
/// supplies its own `BiometricSensor` here.
pub fn session_from_config(
    config: &Config,
) -> Result<Session<KeyringKeyStore, ApprovingSensor, JsonFilePrefs>> {
    let prefs_path = match &config.prefs_path {
        Some(path) => path.clone(),
        None => default_prefs_path()?,
    };
    let service = config
        .keyring_service
        .clone()
        .unwrap_or_else(|| DEFAULT_KEYRING_SERVICE.to_string());

    debug!(?prefs_path, service, "initializing session");
    warn!("no platform biometric integration on this target; challenges auto-approve");

    Ok(Session::new(
        KeyringKeyStore::new(service),
        Arc::new(ApprovingSensor),
        JsonFilePrefs::new(prefs_path),
        config::prompt_spec(config),
    ))
}
