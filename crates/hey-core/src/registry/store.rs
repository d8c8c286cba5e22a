//! Write-through registry store.

use std::sync::Arc;

use super::model::{Registry, RegistryField};
use super::repository::RegistryRepository;
use crate::error::Result;

/// The loaded registry bound to its repository. Every setter saves before
/// returning.
pub struct RegistryStore {
    record: Registry,
    repository: Arc<dyn RegistryRepository>,
}

impl RegistryStore {
    /// Loads the registry, or saves and returns `defaults` if none exists.
    pub fn open(repository: Arc<dyn RegistryRepository>, defaults: Registry) -> Result<Self> {
        match repository.load(defaults.clone())? {
            Some(record) => Ok(Self { record, repository }),
            None => {
                let store = Self {
                    record: defaults,
                    repository,
                };
                store.save()?;
                Ok(store)
            }
        }
    }

    /// Replaces the whole record and saves it.
    pub fn reset(&mut self, record: Registry) -> Result<()> {
        self.record = record;
        self.save()
    }

    pub fn record(&self) -> &Registry {
        &self.record
    }

    pub fn location(&self) -> std::path::PathBuf {
        self.repository.location()
    }

    pub fn save(&self) -> Result<()> {
        self.repository.save(&self.record)
    }

    pub fn update(&mut self, field: RegistryField) -> Result<()> {
        self.record.apply(field)?;
        self.save()
    }

    /// Pins `convo` (the active conversation when `None`). Idempotent.
    pub fn add_pin(&mut self, convo: Option<&str>) -> Result<()> {
        let pin = convo.unwrap_or(self.record.convo()).to_string();
        if self.record.insert_pin(pin) {
            self.save()?;
        }
        Ok(())
    }

    /// Unpins `convo` (the active conversation when `None`). Removing an
    /// absent pin is a no-op.
    pub fn remove_pin(&mut self, convo: Option<&str>) -> Result<()> {
        let pin = convo.unwrap_or(self.record.convo()).to_string();
        if self.record.remove_pin(&pin) {
            self.save()?;
        }
        Ok(())
    }
}
