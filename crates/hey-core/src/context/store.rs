//! Write-through conversation store.

use std::sync::Arc;

use super::model::{Context, ContextField, validate_convo_id};
use super::repository::ContextRepository;
use crate::error::Result;
use crate::message::{Message, MessageRole};

/// One loaded conversation bound to its repository.
///
/// Every mutating call updates the in-memory record and then saves it before
/// returning, so the stored record always reflects the last completed call.
pub struct ContextStore {
    convo: String,
    record: Context,
    repository: Arc<dyn ContextRepository>,
}

impl ContextStore {
    /// Loads `convo`, or initializes and saves a fresh record if none exists.
    pub fn open(repository: Arc<dyn ContextRepository>, convo: &str) -> Result<Self> {
        validate_convo_id(convo)?;
        let (record, fresh) = match repository.find_by_id(convo)? {
            Some(record) => (record, false),
            None => (Context::new(), true),
        };
        let store = Self {
            convo: convo.to_string(),
            record,
            repository,
        };
        if fresh {
            tracing::debug!("Initializing conversation '{}'", store.convo);
            store.save()?;
        }
        Ok(store)
    }

    /// Creates a fresh record for `convo`, replacing anything stored.
    pub fn create(repository: Arc<dyn ContextRepository>, convo: &str) -> Result<Self> {
        validate_convo_id(convo)?;
        let store = Self {
            convo: convo.to_string(),
            record: Context::new(),
            repository,
        };
        store.save()?;
        Ok(store)
    }

    pub fn convo(&self) -> &str {
        &self.convo
    }

    pub fn record(&self) -> &Context {
        &self.record
    }

    pub fn messages(&self) -> &[Message] {
        self.record.messages()
    }

    pub fn save(&self) -> Result<()> {
        self.repository.save(&self.convo, &self.record)
    }

    /// Applies one field update and saves.
    pub fn update(&mut self, field: ContextField) -> Result<()> {
        self.record.apply(field)?;
        self.save()
    }

    /// Appends messages and saves.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<()> {
        self.record.messages_mut().extend(messages);
        self.save()
    }

    /// Removes the last user/assistant pair for a retry and returns the user
    /// text.
    ///
    /// Only acts when the second-to-last message is from the user; otherwise
    /// (or with fewer than two messages) nothing changes and `None` is
    /// returned.
    pub fn pop_user_prompt(&mut self) -> Result<Option<String>> {
        let messages = self.record.messages_mut();
        let len = messages.len();
        if len < 2 || messages[len - 2].role != MessageRole::User {
            return Ok(None);
        }
        messages.truncate(len - 1);
        let user = messages.pop().map(|m| m.text());
        self.save()?;
        Ok(user)
    }
}
