use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::traits::SnapshotStore;
use crate::errors::CoreError;
use crate::models::dataset::Dataset;
use crate::storage::encryption::KdfParams;
use crate::storage::manager::StorageManager;

/// Plain JSON snapshot on the local disk (e.g. `bills.json` in the app's
/// user-data directory).
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    fn name(&self) -> &str {
        "JsonFile"
    }

    async fn load(&self) -> Result<Option<Dataset>, CoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        StorageManager::from_json(&text).map(Some)
    }

    async fn save(&self, dataset: &Dataset) -> Result<(), CoreError> {
        let json = StorageManager::to_json(dataset)?;
        write_replacing(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), "Wrote JSON snapshot");
        Ok(())
    }
}

/// Password-protected snapshot file (FNTK container).
pub struct EncryptedFileStore {
    path: PathBuf,
    password: String,
    kdf_params: KdfParams,
}

impl EncryptedFileStore {
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
            kdf_params: KdfParams::default(),
        }
    }

    /// Override the key-derivation cost used for new saves. Existing files
    /// always open with the parameters in their own header.
    pub fn with_kdf_params(mut self, kdf_params: KdfParams) -> Self {
        self.kdf_params = kdf_params;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for EncryptedFileStore {
    fn name(&self) -> &str {
        "EncryptedFile"
    }

    async fn load(&self) -> Result<Option<Dataset>, CoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        StorageManager::load_from_bytes(&bytes, &self.password).map(Some)
    }

    async fn save(&self, dataset: &Dataset) -> Result<(), CoreError> {
        let bytes = StorageManager::save_to_bytes_with(dataset, &self.password, self.kdf_params)?;
        write_replacing(&self.path, &bytes)?;
        debug!(path = %self.path.display(), "Wrote encrypted snapshot");
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target, so a crash
/// mid-write never leaves a half-written snapshot behind.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
