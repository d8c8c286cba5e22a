//! Archive, tidy, delete, pins and reset.

use std::fs;

use hey_core::context::{ContextStore, DEFAULT_CONVO};
use hey_core::error::Result;

use super::listing::ConvoEntry;
use super::manager::ConversationManager;

/// Outcome of [`ConversationManager::archive`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveReport {
    pub archived: Vec<String>,
    /// Pinned conversations left in place.
    pub skipped: Vec<String>,
}

impl ConversationManager {
    /// Moves every unpinned conversation record into `archive/`.
    /// Transcripts stay where they are.
    pub fn archive(&mut self) -> Result<ArchiveReport> {
        let mut report = ArchiveReport::default();
        for id in self.contexts.list_ids()? {
            if self.registry.record().is_pinned(&id) {
                tracing::info!("{} is pinned, skipping", id);
                report.skipped.push(id);
                continue;
            }
            self.contexts.archive(&id)?;
            report.archived.push(id);
        }
        self.reload_if_removed(&report.archived)?;
        Ok(report)
    }

    /// Deletes every conversation record without a title, including records
    /// that cannot be parsed. Returns the removed ids.
    ///
    /// A conversation whose title derivation kept failing still has a
    /// fallback title, so only conversations that never completed a turn
    /// (or were written by hand) are affected.
    pub fn tidy_contexts(&mut self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for id in self.contexts.list_ids()? {
            let untitled = match self.contexts.find_by_id(&id) {
                Ok(Some(record)) => record.title().is_none(),
                Ok(None) => false,
                Err(err) => {
                    tracing::warn!("Removing unreadable conversation '{}': {}", id, err);
                    true
                }
            };
            if untitled {
                self.contexts.delete(&id)?;
                tracing::info!("Removed untitled conversation '{}'", id);
                removed.push(id);
            }
        }
        self.reload_if_removed(&removed)?;
        Ok(removed)
    }

    /// Deletes `convo` and its transcript once `confirm` agrees. Returns
    /// whether anything was deleted.
    pub fn delete_convo<F>(&mut self, convo: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&ConvoEntry) -> bool,
    {
        let entry = self.entry_for(convo);
        if !confirm(&entry) {
            return Ok(false);
        }

        self.contexts.delete(convo)?;
        if let Some(transcript) = &entry.transcript {
            match fs::remove_file(transcript) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("Deleted conversation '{}'", convo);
        self.reload_if_removed(&[convo.to_string()])?;
        Ok(true)
    }

    /// Picks a listed conversation and deletes it after confirmation.
    pub fn delete_picked<F>(&mut self, token: &str, confirm: F) -> Result<Option<ConvoEntry>>
    where
        F: FnOnce(&ConvoEntry) -> bool,
    {
        let entry = Self::pick_entry(self.convo_entries()?, token)?;
        let deleted = self.delete_convo(&entry.id, confirm)?;
        Ok(deleted.then_some(entry))
    }

    /// Switches to the listed conversation picked by `token`.
    pub fn set_convo(&mut self, token: &str) -> Result<ConvoEntry> {
        let entry = Self::pick_entry(self.convo_entries()?, token)?;
        self.switch_context(&entry.id)?;
        Ok(entry)
    }

    /// Pins `convo`, the active conversation when `None`.
    pub fn pin(&mut self, convo: Option<&str>) -> Result<()> {
        self.registry.add_pin(convo)
    }

    /// Unpins `convo`, the active conversation when `None`.
    pub fn unpin(&mut self, convo: Option<&str>) -> Result<()> {
        self.registry.remove_pin(convo)
    }

    /// Switches to the pinned conversation picked by `token`.
    pub fn set_pin(&mut self, token: &str) -> Result<ConvoEntry> {
        let entry = Self::pick_entry(self.pin_entries(), token)?;
        self.switch_context(&entry.id)?;
        Ok(entry)
    }

    /// Unpins the pinned conversation picked by `token`.
    pub fn unpin_picked(&mut self, token: &str) -> Result<ConvoEntry> {
        let entry = Self::pick_entry(self.pin_entries(), token)?;
        self.registry.remove_pin(Some(&entry.id))?;
        Ok(entry)
    }

    /// Rewrites the registry with defaults and starts `main` over.
    pub fn reset(&mut self) -> Result<()> {
        self.registry.reset(self.defaults.clone())?;
        self.context = ContextStore::create(self.contexts.clone(), DEFAULT_CONVO)?;
        tracing::info!("Reset registry and conversation '{}'", DEFAULT_CONVO);
        Ok(())
    }

    /// If the active conversation was just removed from storage, start it
    /// over so the in-memory store matches the directory.
    fn reload_if_removed(&mut self, removed: &[String]) -> Result<()> {
        if removed.iter().any(|id| id == self.context.convo()) {
            let convo = self.context.convo().to_string();
            self.context = ContextStore::open(self.contexts.clone(), &convo)?;
        }
        Ok(())
    }
}
