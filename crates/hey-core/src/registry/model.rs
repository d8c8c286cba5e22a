//! Registry record: process-wide durable settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::{DEFAULT_CONVO, context_file_name, validate_convo_id};
use crate::error::{HeyError, Result};
use crate::message::ImageDetail;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMP: u8 = 7;
pub const MAX_TEMP: u8 = 10;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Global settings plus the active conversation and the pin set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    model: String,
    temp: u8,
    max_tokens: u32,
    prompts_dir: PathBuf,
    editor: String,
    pins: Vec<String>,
    convo: String,
    context_filename: String,
    detail: ImageDetail,
    codify: bool,
}

/// A single setting update applied by [`Registry::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryField {
    Model(String),
    /// Temperature in tenths, 0..=10.
    Temp(u8),
    MaxTokens(u32),
    PromptsDir(PathBuf),
    Editor(String),
    /// Switches the active conversation and its file name together.
    Convo(String),
    Detail(ImageDetail),
    Codify(bool),
}

impl Registry {
    /// Defaults for a registry living in `prompts_dir`.
    pub fn with_defaults(prompts_dir: impl Into<PathBuf>, editor: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temp: DEFAULT_TEMP,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompts_dir: prompts_dir.into(),
            editor: editor.into(),
            pins: Vec::new(),
            convo: DEFAULT_CONVO.to_string(),
            context_filename: context_file_name(DEFAULT_CONVO),
            detail: ImageDetail::default(),
            codify: false,
        }
    }

    /// Parses a stored registry over `defaults`. Unknown keys are rejected.
    pub fn from_json(json: &str, defaults: Registry) -> Result<Self> {
        let patch: RegistryPatch = serde_json::from_str(json)?;
        let mut registry = defaults;
        registry.merge(patch)?;
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn merge(&mut self, patch: RegistryPatch) -> Result<()> {
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(temp) = patch.temp {
            self.temp = checked_temp(temp)?;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(prompts_dir) = patch.prompts_dir {
            self.prompts_dir = prompts_dir;
        }
        if let Some(editor) = patch.editor {
            self.editor = editor;
        }
        if let Some(pins) = patch.pins {
            self.pins.clear();
            for pin in pins {
                self.insert_pin(pin);
            }
        }
        if let Some(convo) = patch.convo {
            self.convo = convo;
        }
        if let Some(context_filename) = patch.context_filename {
            self.context_filename = context_filename;
        }
        if let Some(detail) = patch.detail {
            self.detail = detail;
        }
        if let Some(codify) = patch.codify {
            self.codify = codify;
        }
        Ok(())
    }

    /// Applies one in-memory setting update.
    pub fn apply(&mut self, field: RegistryField) -> Result<()> {
        match field {
            RegistryField::Model(model) => self.model = model,
            RegistryField::Temp(temp) => self.temp = checked_temp(temp.into())?,
            RegistryField::MaxTokens(max_tokens) => {
                if max_tokens == 0 {
                    return Err(HeyError::invalid_input("max tokens must be positive"));
                }
                self.max_tokens = max_tokens;
            }
            RegistryField::PromptsDir(dir) => self.prompts_dir = dir,
            RegistryField::Editor(editor) => self.editor = editor,
            RegistryField::Convo(convo) => {
                validate_convo_id(&convo)?;
                self.context_filename = context_file_name(&convo);
                self.convo = convo;
            }
            RegistryField::Detail(detail) => self.detail = detail,
            RegistryField::Codify(codify) => self.codify = codify,
        }
        Ok(())
    }

    /// Adds a pin; returns whether the set changed.
    pub(crate) fn insert_pin(&mut self, pin: String) -> bool {
        if self.pins.contains(&pin) {
            return false;
        }
        self.pins.push(pin);
        true
    }

    /// Removes a pin; returns whether the set changed.
    pub(crate) fn remove_pin(&mut self, pin: &str) -> bool {
        let before = self.pins.len();
        self.pins.retain(|p| p != pin);
        self.pins.len() != before
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Stored temperature in tenths.
    pub fn temp(&self) -> u8 {
        self.temp
    }

    /// Temperature as sent to the endpoint.
    pub fn temperature(&self) -> f32 {
        f32::from(self.temp) / 10.0
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn pins(&self) -> &[String] {
        &self.pins
    }

    pub fn is_pinned(&self, convo: &str) -> bool {
        self.pins.iter().any(|p| p == convo)
    }

    pub fn convo(&self) -> &str {
        &self.convo
    }

    pub fn context_filename(&self) -> &str {
        &self.context_filename
    }

    pub fn detail(&self) -> ImageDetail {
        self.detail
    }

    pub fn codify(&self) -> bool {
        self.codify
    }
}

fn checked_temp(temp: u32) -> Result<u8> {
    u8::try_from(temp)
        .ok()
        .filter(|t| *t <= MAX_TEMP)
        .ok_or_else(|| {
            HeyError::invalid_input(format!("temperature must be between 0 and {MAX_TEMP}, got {temp}"))
        })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryPatch {
    model: Option<String>,
    temp: Option<u32>,
    max_tokens: Option<u32>,
    prompts_dir: Option<PathBuf>,
    editor: Option<String>,
    pins: Option<Vec<String>>,
    convo: Option<String>,
    context_filename: Option<String>,
    detail: Option<ImageDetail>,
    codify: Option<bool>,
}
