//! Application layer for hey.
//!
//! [`ConversationManager`] ties the stores, the transcript files and the
//! completion client together into the operations the command line exposes.

pub mod conversation;

pub use conversation::{
    ArchiveReport, BLANK_TITLE, ConversationManager, ConvoEntry, Info, PromptRequest,
};
