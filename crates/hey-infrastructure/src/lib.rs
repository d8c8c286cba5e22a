//! Filesystem side of hey: JSON repositories for conversations and the
//! registry, the prompts-directory layout, transcript files and image loading.

pub mod image_loader;
pub mod json_context_repository;
pub mod json_registry_repository;
pub mod paths;
pub mod storage;
pub mod transcript_writer;

pub use crate::json_context_repository::JsonContextRepository;
pub use crate::json_registry_repository::JsonRegistryRepository;
pub use crate::paths::HeyPaths;
