//! Conversation ("context") record.

use chrono::{Local, NaiveDateTime};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HeyError, Result};
use crate::message::Message;
use crate::slug::slugify;

/// Persona used when a conversation has no explicit system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Prefix shared by every conversation record file.
pub const CONTEXT_FILE_PREFIX: &str = ".hey_context.";

/// Conversation used when nothing else has been selected.
pub const DEFAULT_CONVO: &str = "main";

/// Length of generated conversation ids.
pub const CONVO_ID_LEN: usize = 8;

/// One persisted conversation.
///
/// Field names on disk follow the historical file format (`md_file`,
/// `smart_title`, `smart_title_slug`). `title_slug` is always
/// `slugify(title)`; the only way to change either is [`ContextField::Title`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    start_date: Option<NaiveDateTime>,
    end_date: Option<NaiveDateTime>,
    #[serde(rename = "md_file")]
    transcript_path: Option<PathBuf>,
    messages: Vec<Message>,
    #[serde(rename = "smart_title")]
    title: Option<String>,
    #[serde(rename = "smart_title_slug")]
    title_slug: Option<String>,
    system: String,
}

/// A single field update applied by [`Context::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextField {
    StartDate(NaiveDateTime),
    EndDate(NaiveDateTime),
    /// Assigns the transcript location. Only allowed once.
    TranscriptPath(PathBuf),
    /// Sets the title and recomputes its slug.
    Title(String),
    SystemPrompt(String),
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A fresh conversation starting now.
    pub fn new() -> Self {
        Self {
            start_date: Some(now()),
            end_date: None,
            transcript_path: None,
            messages: Vec::new(),
            title: None,
            title_slug: None,
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Parses a stored conversation: defaults first, then the file's fields on
    /// top. Unknown keys are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let patch: ContextPatch = serde_json::from_str(json)?;
        let mut context = Self::new();
        context.merge(patch);
        Ok(context)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn merge(&mut self, patch: ContextPatch) {
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(transcript_path) = patch.md_file {
            self.transcript_path = transcript_path;
        }
        if let Some(messages) = patch.messages {
            self.messages = messages;
        }
        if let Some(title) = patch.smart_title {
            self.title = title;
        }
        if let Some(slug) = patch.smart_title_slug {
            self.title_slug = slug;
        }
        // Files written by older versions may carry a slug that drifted from
        // the title; the title wins.
        if let Some(title) = &self.title {
            self.title_slug = Some(slugify(title));
        }
        if let Some(system) = patch.system {
            self.system = system;
        }
    }

    /// Applies one in-memory field update.
    pub fn apply(&mut self, field: ContextField) -> Result<()> {
        match field {
            ContextField::StartDate(date) => self.start_date = Some(date),
            ContextField::EndDate(date) => self.end_date = Some(date),
            ContextField::TranscriptPath(path) => {
                if let Some(existing) = &self.transcript_path {
                    if existing != &path {
                        return Err(HeyError::invalid_input(format!(
                            "transcript path already assigned: {}",
                            existing.display()
                        )));
                    }
                }
                self.transcript_path = Some(path);
            }
            ContextField::Title(title) => {
                self.title_slug = Some(slugify(&title));
                self.title = Some(title);
            }
            ContextField::SystemPrompt(system) => self.system = system,
        }
        Ok(())
    }

    pub(crate) fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    pub fn start_date(&self) -> Option<&NaiveDateTime> {
        self.start_date.as_ref()
    }

    pub fn end_date(&self) -> Option<&NaiveDateTime> {
        self.end_date.as_ref()
    }

    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript_path.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The derived title, ignoring an empty string.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    pub fn title_slug(&self) -> Option<&str> {
        self.title_slug.as_deref()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    /// Title derivation is due right after the first turn, or whenever no
    /// title exists yet.
    pub fn needs_title(&self) -> bool {
        self.messages.len() == 2 || self.title().is_none()
    }
}

/// Partial view of a conversation file. `Some(None)` means the key was present
/// with `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContextPatch {
    #[serde(default, deserialize_with = "present")]
    start_date: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "present")]
    end_date: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "present")]
    md_file: Option<Option<PathBuf>>,
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default, deserialize_with = "present")]
    smart_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    smart_title_slug: Option<Option<String>>,
    #[serde(default)]
    system: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Current local time without offset, matching the stored format.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A random id of [`CONVO_ID_LEN`] ASCII alphanumerics.
pub fn generate_convo_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONVO_ID_LEN)
        .map(char::from)
        .collect()
}

/// File name of the record for `convo`.
pub fn context_file_name(convo: &str) -> String {
    format!("{CONTEXT_FILE_PREFIX}{convo}.json")
}

/// Recovers the conversation id from a record file name: the second-to-last
/// `.`-separated segment.
pub fn convo_id_from_file_name(file_name: &str) -> Option<String> {
    if !file_name.starts_with(CONTEXT_FILE_PREFIX) || !file_name.ends_with(".json") {
        return None;
    }
    let segments: Vec<&str> = file_name.split('.').collect();
    if segments.len() < 2 {
        return None;
    }
    let id = segments[segments.len() - 2];
    (!id.is_empty()).then(|| id.to_string())
}

/// Conversation ids become part of a `.`-delimited file name, so they may not
/// contain `.` or path separators.
pub fn validate_convo_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(HeyError::invalid_input("conversation id must not be empty"));
    }
    if id.contains(['.', '/', '\\']) {
        return Err(HeyError::invalid_input(format!(
            "conversation id '{id}' must not contain '.', '/' or '\\'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_defaults() {
        let ctx = Context::new();
        assert!(ctx.start_date().is_some());
        assert!(ctx.end_date().is_none());
        assert!(ctx.messages().is_empty());
        assert!(ctx.title().is_none());
        assert_eq!(ctx.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_file_format_keys() {
        let mut ctx = Context::new();
        ctx.apply(ContextField::Title("My Title".into())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&ctx.to_json().unwrap()).unwrap();
        for key in [
            "start_date",
            "end_date",
            "md_file",
            "messages",
            "smart_title",
            "smart_title_slug",
            "system",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["smart_title_slug"], "my_title");
    }

    #[test]
    fn test_merge_over_defaults() {
        let json = r#"{
            "start_date": "2024-01-02T03:04:05.123456",
            "end_date": null,
            "md_file": "/tmp/x.md",
            "messages": [{"role": "user", "content": "hi"}],
            "smart_title": "Greeting",
            "smart_title_slug": "greeting"
        }"#;
        let ctx = Context::from_json(json).unwrap();
        assert_eq!(ctx.messages().len(), 1);
        assert_eq!(ctx.title(), Some("Greeting"));
        assert_eq!(ctx.transcript_path(), Some(Path::new("/tmp/x.md")));
        // absent key keeps the default
        assert_eq!(ctx.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_null_start_date_overrides_default() {
        let ctx = Context::from_json(r#"{"start_date": null}"#).unwrap();
        assert!(ctx.start_date().is_none());
    }

    #[test]
    fn test_unknown_key_fails_loudly() {
        let err = Context::from_json(r#"{"messages": [], "surprise": 1}"#).unwrap_err();
        assert!(matches!(err, HeyError::Serialization { .. }));
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(Context::from_json("{not json").is_err());
    }

    #[test]
    fn test_title_update_recomputes_slug() {
        let mut ctx = Context::new();
        ctx.apply(ContextField::Title("First Title".into())).unwrap();
        assert_eq!(ctx.title_slug(), Some("first_title"));
        ctx.apply(ContextField::Title("Second, Better Title!".into()))
            .unwrap();
        assert_eq!(ctx.title_slug(), Some("second_better_title"));
    }

    #[test]
    fn test_stale_slug_on_disk_is_recomputed() {
        let ctx = Context::from_json(r#"{"smart_title": "Real Title", "smart_title_slug": "stale"}"#)
            .unwrap();
        assert_eq!(ctx.title_slug(), Some("real_title"));
    }

    #[test]
    fn test_transcript_path_set_once() {
        let mut ctx = Context::new();
        ctx.apply(ContextField::TranscriptPath("/a.md".into())).unwrap();
        ctx.apply(ContextField::TranscriptPath("/a.md".into())).unwrap();
        assert!(ctx.apply(ContextField::TranscriptPath("/b.md".into())).is_err());
        assert_eq!(ctx.transcript_path(), Some(Path::new("/a.md")));
    }

    #[test]
    fn test_needs_title() {
        let mut ctx = Context::new();
        assert!(ctx.needs_title());

        ctx.messages_mut()
            .extend([Message::user("q"), Message::assistant("a")]);
        ctx.apply(ContextField::Title("t".into())).unwrap();
        // exactly two messages: due even with a title
        assert!(ctx.needs_title());

        ctx.messages_mut()
            .extend([Message::user("q2"), Message::assistant("a2")]);
        assert!(!ctx.needs_title());
    }

    #[test]
    fn test_empty_title_counts_as_absent() {
        let ctx = Context::from_json(r#"{"smart_title": ""}"#).unwrap();
        assert!(ctx.title().is_none());
    }

    #[test]
    fn test_generate_convo_id() {
        let id = generate_convo_id();
        assert_eq!(id.len(), CONVO_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(validate_convo_id(&id).is_ok());
    }

    #[test]
    fn test_file_name_round_trip() {
        assert_eq!(context_file_name("main"), ".hey_context.main.json");
        assert_eq!(
            convo_id_from_file_name(".hey_context.JcTzSesN.json"),
            Some("JcTzSesN".to_string())
        );
        assert_eq!(convo_id_from_file_name("notes.md"), None);
        assert_eq!(convo_id_from_file_name(".hey_context.main.lock"), None);
        assert_eq!(convo_id_from_file_name(".hey_config.json"), None);
    }

    #[test]
    fn test_validate_convo_id() {
        assert!(validate_convo_id("main").is_ok());
        assert!(validate_convo_id("").is_err());
        assert!(validate_convo_id("a.b").is_err());
        assert!(validate_convo_id("../x").is_err());
    }
}
