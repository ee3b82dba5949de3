use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::dataset::Dataset;

/// A place a whole dataset snapshot is loaded from and saved to.
///
/// Stores move complete snapshots only: `save` replaces whatever was stored
/// before, `load` returns the last saved snapshot. `Ok(None)` means nothing
/// has been saved yet and the caller should start from the default dataset.
/// With several writers the last `save` wins.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SnapshotStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the stored snapshot, if any.
    async fn load(&self) -> Result<Option<Dataset>, CoreError>;

    /// Replace the stored snapshot with `dataset`.
    async fn save(&self, dataset: &Dataset) -> Result<(), CoreError>;
}
