//! Registry repository trait.

use std::path::PathBuf;

use super::model::Registry;
use crate::error::Result;

/// Durable storage for the single registry record.
pub trait RegistryRepository: Send + Sync {
    /// Loads the registry, merging the stored fields over `defaults`.
    ///
    /// - `Ok(Some(Registry))`: stored registry found
    /// - `Ok(None)`: nothing stored yet (missing or empty file)
    /// - `Err(_)`: stored registry could not be read or parsed
    fn load(&self, defaults: Registry) -> Result<Option<Registry>>;

    fn save(&self, registry: &Registry) -> Result<()>;

    /// Where the registry lives, for display.
    fn location(&self) -> PathBuf;
}
