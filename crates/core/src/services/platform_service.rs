use tracing::debug;

use super::validation::required_text;
use crate::errors::CoreError;
use crate::models::dataset::Dataset;

/// Manages the list of platform tags investments are filed under.
pub struct PlatformService;

impl PlatformService {
    pub fn new() -> Self {
        Self
    }

    /// Add a platform. Names are matched exactly; the list stays sorted.
    pub fn add_platform(&self, dataset: &mut Dataset, name: &str) -> Result<(), CoreError> {
        let name = required_text("Platform name", name)?;
        if dataset.platforms.contains(&name) {
            return Err(CoreError::DuplicatePlatform(name));
        }
        debug!(platform = %name, "Added platform");
        dataset.platforms.push(name);
        dataset.platforms.sort();
        Ok(())
    }

    /// Remove a platform that no open or sold investment references.
    pub fn remove_platform(&self, dataset: &mut Dataset, name: &str) -> Result<(), CoreError> {
        let idx = dataset
            .platforms
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| CoreError::PlatformNotFound(name.to_string()))?;

        if self.is_in_use(dataset, name) {
            return Err(CoreError::PlatformInUse(name.to_string()));
        }

        dataset.platforms.remove(idx);
        debug!(platform = %name, "Removed platform");
        Ok(())
    }

    /// Whether any open or sold investment references `name`.
    pub fn is_in_use(&self, dataset: &Dataset, name: &str) -> bool {
        dataset.investments.iter().any(|i| i.platform == name)
            || dataset.sold_investments.iter().any(|s| s.platform == name)
    }
}

impl Default for PlatformService {
    fn default() -> Self {
        Self::new()
    }
}
