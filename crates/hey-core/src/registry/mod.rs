//! Registry domain module: global settings, the active conversation and pins.

mod model;
mod repository;
mod store;

pub use model::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMP, MAX_TEMP, Registry, RegistryField,
};
pub use repository::RegistryRepository;
pub use store::RegistryStore;
