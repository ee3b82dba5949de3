use tracing::debug;

use super::encryption::{random_bytes, KdfParams, SnapshotKey};
use super::format::{ContainerHeader, CURRENT_VERSION};
use crate::errors::CoreError;
use crate::models::dataset::Dataset;

/// Whole-snapshot encode/decode. There is no partial or delta format:
/// a dataset is always written and read in one piece.
pub struct StorageManager;

impl StorageManager {
    /// Plain JSON snapshot in the shared dataset shape.
    pub fn to_json(dataset: &Dataset) -> Result<String, CoreError> {
        serde_json::to_string_pretty(dataset)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize dataset: {e}")))
    }

    /// Parse a JSON snapshot. Missing collections default to empty.
    pub fn from_json(json: &str) -> Result<Dataset, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Deserialization(format!("Failed to parse dataset: {e}")))
    }

    /// Dataset → bincode → AES-256-GCM(Argon2id(password)) → FNTK container.
    pub fn save_to_bytes(dataset: &Dataset, password: &str) -> Result<Vec<u8>, CoreError> {
        Self::save_to_bytes_with(dataset, password, KdfParams::default())
    }

    /// Like `save_to_bytes` with explicit key-derivation cost.
    pub fn save_to_bytes_with(
        dataset: &Dataset,
        password: &str,
        kdf_params: KdfParams,
    ) -> Result<Vec<u8>, CoreError> {
        kdf_params.check_bounds()?;
        let plaintext = bincode::serialize(dataset)
            .map_err(|e| CoreError::Serialization(format!("Failed to encode dataset: {e}")))?;

        let header = ContainerHeader {
            version: CURRENT_VERSION,
            kdf_params,
            salt: random_bytes()?,
            nonce: random_bytes()?,
        };
        let key = SnapshotKey::derive(password, &header.salt, &header.kdf_params)?;
        let ciphertext = key.seal(&plaintext, &header.nonce)?;

        debug!(plaintext_len = plaintext.len(), "Sealed dataset snapshot");
        Ok(header.encode(&ciphertext))
    }

    /// FNTK container → decrypt → bincode → Dataset.
    pub fn load_from_bytes(data: &[u8], password: &str) -> Result<Dataset, CoreError> {
        let (header, ciphertext) = ContainerHeader::decode(data)?;
        let key = SnapshotKey::derive(password, &header.salt, &header.kdf_params)?;
        let plaintext = key.open(ciphertext, &header.nonce)?;

        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to decode dataset: {e}")))
    }
}
