//! Domain layer for hey.
//!
//! Conversations, the registry, messages and the pure helpers around them
//! (slugs, list picking, transcript rendering). Persistence and the remote
//! endpoint are reached only through the traits defined here.

pub mod completion;
pub mod context;
pub mod error;
pub mod message;
pub mod pick;
pub mod registry;
pub mod slug;
pub mod transcript;

// Re-export common error type
pub use error::{HeyError, Result};
