//! Conversation repository trait.

use std::path::PathBuf;

use super::model::Context;
use crate::error::Result;

/// Durable storage for conversations, one record per conversation id.
///
/// The storage listing is authoritative for which conversations exist.
pub trait ContextRepository: Send + Sync {
    /// Loads a conversation.
    ///
    /// - `Ok(Some(Context))`: found and parsed
    /// - `Ok(None)`: no record for this id
    /// - `Err(_)`: the record exists but could not be read or parsed
    fn find_by_id(&self, convo: &str) -> Result<Option<Context>>;

    /// Writes the full record.
    fn save(&self, convo: &str, context: &Context) -> Result<()>;

    /// Removes the record. Deleting a missing record is not an error.
    fn delete(&self, convo: &str) -> Result<()>;

    /// Ids of every stored conversation, most recently modified first.
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Moves the record out of the active set into the archive.
    fn archive(&self, convo: &str) -> Result<()>;

    /// Where the record for `convo` lives, for display.
    fn location(&self, convo: &str) -> PathBuf;
}
