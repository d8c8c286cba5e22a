//! Conversation domain module.
//!
//! - `model`: the persisted conversation record (`Context`) and its field updates
//! - `repository`: persistence trait
//! - `store`: write-through wrapper binding a record to its repository

mod model;
mod repository;
mod store;

pub use model::{
    CONTEXT_FILE_PREFIX, CONVO_ID_LEN, Context, ContextField, DEFAULT_CONVO,
    DEFAULT_SYSTEM_PROMPT, context_file_name, convo_id_from_file_name, generate_convo_id, now,
    validate_convo_id,
};
pub use repository::ContextRepository;
pub use store::ContextStore;
