//! JSON-file based RegistryRepository implementation.

use hey_core::error::Result;
use hey_core::registry::{Registry, RegistryRepository};
use std::path::PathBuf;

use crate::paths::HeyPaths;
use crate::storage::AtomicJsonFile;

/// Stores the registry as `.hey_config.json` in the prompts directory.
#[derive(Debug, Clone)]
pub struct JsonRegistryRepository {
    file: AtomicJsonFile,
}

impl JsonRegistryRepository {
    pub fn new(paths: &HeyPaths) -> Self {
        Self {
            file: AtomicJsonFile::new(paths.registry_file()),
        }
    }
}

impl RegistryRepository for JsonRegistryRepository {
    fn load(&self, defaults: Registry) -> Result<Option<Registry>> {
        match self.file.load()? {
            Some(json) => Registry::from_json(&json, defaults).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        self.file.save(&registry.to_json()?)
    }

    fn location(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}
