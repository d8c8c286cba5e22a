//! Conversation orchestration and lifecycle.

mod lifecycle;
mod listing;
mod manager;

#[cfg(test)]
mod test_support;

pub use lifecycle::ArchiveReport;
pub use listing::{BLANK_TITLE, ConvoEntry, Info};
pub use manager::{
    CODIFY_INSTRUCTION, ConversationManager, PromptRequest, TITLE_MAX_LENGTH, TITLE_MODEL,
};
