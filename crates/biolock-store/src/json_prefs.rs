use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::PathBuf,
};

use async_trait::async_trait;
use biolock_core::prefs::{PrefStore, PrefStoreError};
use tempfile::NamedTempFile;

/// File-backed preference store: one JSON object per file.
///
/// Every write lands in a temp file first and is renamed over the previous
/// contents, so an interrupted save leaves the prior records intact.
pub struct JsonFilePrefs {
    path: PathBuf,
}

impl JsonFilePrefs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PrefStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(backend_err(err)),
        };
        serde_json::from_str(&contents).map_err(backend_err)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), PrefStoreError> {
        let parent = self.path.parent().ok_or_else(|| PrefStoreError::Backend {
            reason: "invalid prefs path".to_string(),
        })?;
        fs::create_dir_all(parent).map_err(backend_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(backend_err)?;
        let json = serde_json::to_vec_pretty(map).map_err(backend_err)?;
        tmp.write_all(&json).map_err(backend_err)?;
        tmp.flush().map_err(backend_err)?;
        tmp.persist(&self.path).map_err(|e| backend_err(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl PrefStore for JsonFilePrefs {
    async fn get(&self, key: &str) -> Result<Option<String>, PrefStoreError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), PrefStoreError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

fn backend_err<E: ToString>(err: E) -> PrefStoreError {
    PrefStoreError::Backend {
        reason: err.to_string(),
    }
}
