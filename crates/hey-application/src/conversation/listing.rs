//! Read-only views: conversation listings, info and raw records.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hey_core::error::{HeyError, Result};
use hey_core::message::ImageDetail;
use hey_core::pick::pick;

use super::manager::ConversationManager;

/// Shown in listings for a conversation without a title.
pub const BLANK_TITLE: &str = "<BLANK>";

/// One conversation as shown in a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvoEntry {
    pub id: String,
    pub title: Option<String>,
    pub transcript: Option<PathBuf>,
    pub active: bool,
    pub pinned: bool,
}

impl ConvoEntry {
    /// Name used when picking from a list: the title, or the id when there
    /// is no title.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(BLANK_TITLE)
    }
}

/// Snapshot of the current settings and active conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub prompts_dir: PathBuf,
    pub registry_file: PathBuf,
    pub context_file: PathBuf,
    pub editor: String,
    pub model: String,
    pub transcript: Option<PathBuf>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub detail: ImageDetail,
    pub codify: bool,
    pub convo: String,
    pub title: Option<String>,
    pub messages: usize,
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "prompts dir: {}", self.prompts_dir.display())?;
        writeln!(f, "config file: {}", self.registry_file.display())?;
        writeln!(f, "context file: {}", self.context_file.display())?;
        writeln!(f, "editor: {}", self.editor)?;
        writeln!(f, "model: {}", self.model)?;
        match &self.transcript {
            Some(path) => writeln!(f, "md_file: {}", path.display())?,
            None => writeln!(f, "md_file: None")?,
        }
        writeln!(f, "temp: {}", self.temperature)?;
        writeln!(f, "max tokens: {}", self.max_tokens)?;
        writeln!(f, "detail: {}", self.detail)?;
        writeln!(f, "codify: {}", self.codify)?;
        writeln!(f, "convo: {}", self.convo)?;
        if let Some(title) = &self.title {
            writeln!(f, "smart_title: {title}")?;
        }
        write!(f, "messages: {}", self.messages)
    }
}

impl ConversationManager {
    /// Listing entry for `convo`. A record that cannot be read is listed
    /// without a title.
    pub(super) fn entry_for(&self, convo: &str) -> ConvoEntry {
        let registry = self.registry.record();
        let (title, transcript) = if convo == self.context.convo() {
            let record = self.context.record();
            (
                record.title().map(str::to_string),
                record.transcript_path().map(Path::to_path_buf),
            )
        } else {
            match self.contexts.find_by_id(convo) {
                Ok(Some(record)) => (
                    record.title().map(str::to_string),
                    record.transcript_path().map(Path::to_path_buf),
                ),
                Ok(None) => (None, None),
                Err(err) => {
                    tracing::warn!("Cannot read conversation '{}': {}", convo, err);
                    (None, None)
                }
            }
        };

        ConvoEntry {
            id: convo.to_string(),
            title,
            transcript,
            active: convo == self.context.convo(),
            pinned: registry.is_pinned(convo),
        }
    }

    /// Every stored conversation, most recently modified first.
    pub fn convo_entries(&self) -> Result<Vec<ConvoEntry>> {
        Ok(self
            .contexts
            .list_ids()?
            .iter()
            .map(|id| self.entry_for(id))
            .collect())
    }

    /// Pinned conversations in pin order.
    pub fn pin_entries(&self) -> Vec<ConvoEntry> {
        self.registry
            .record()
            .pins()
            .iter()
            .map(|id| self.entry_for(id))
            .collect()
    }

    /// Resolves `token` (index, title or id) against `entries`.
    pub(super) fn pick_entry(entries: Vec<ConvoEntry>, token: &str) -> Result<ConvoEntry> {
        let labels: Vec<&str> = entries.iter().map(ConvoEntry::label).collect();
        let index = pick(&labels, token)?;
        entries
            .into_iter()
            .nth(index)
            .ok_or_else(|| HeyError::internal("picked index outside the listing"))
    }

    /// The picked conversation and the contents of its transcript.
    pub fn show(&self, token: &str) -> Result<(ConvoEntry, String)> {
        let entry = Self::pick_entry(self.convo_entries()?, token)?;
        let path = entry
            .transcript
            .clone()
            .ok_or_else(|| HeyError::not_found("transcript", entry.id.clone()))?;
        let content = fs::read_to_string(&path)
            .map_err(|e| HeyError::io(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok((entry, content))
    }

    pub fn info(&self) -> Info {
        let registry = self.registry.record();
        let record = self.context.record();
        Info {
            prompts_dir: self.paths.prompts_dir().to_path_buf(),
            registry_file: self.registry.location(),
            context_file: self.contexts.location(self.context.convo()),
            editor: registry.editor().to_string(),
            model: registry.model().to_string(),
            transcript: record.transcript_path().map(Path::to_path_buf),
            temperature: registry.temperature(),
            max_tokens: registry.max_tokens(),
            detail: registry.detail(),
            codify: registry.codify(),
            convo: self.context.convo().to_string(),
            title: record.title().map(str::to_string),
            messages: record.messages().len(),
        }
    }

    /// The active transcript, or if it does not exist the most recently
    /// modified `.md` file in the prompts directory.
    pub fn most_recent_transcript(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = self.context.record().transcript_path() {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
        }
        newest_markdown(self.paths.prompts_dir())
    }

    /// The active conversation record as pretty JSON.
    pub fn raw_json(&self) -> Result<String> {
        self.context.record().to_json()
    }
}

fn newest_markdown(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}
