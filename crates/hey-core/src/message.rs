//! Conversation message types.
//!
//! Messages serialize to the chat-completion wire shape, so the same value is
//! stored in a conversation file and sent to the remote endpoint:
//!
//! ```json
//! {"role": "user", "content": "plain text"}
//! {"role": "user", "content": [
//!     {"type": "text", "text": "what is this?"},
//!     {"type": "image_url", "image_url": {"url": "https://...", "detail": "low"}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HeyError;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Capitalized name used for transcript headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution requested from the model for an attached image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    High,
    #[default]
    Low,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::High => "high",
            ImageDetail::Low => "low",
        }
    }
}

impl FromStr for ImageDetail {
    type Err = HeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ImageDetail::High),
            "low" => Ok(ImageDetail::Low),
            other => Err(HeyError::invalid_input(format!(
                "image detail must be 'high' or 'low', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ImageDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the bytes of an image come from once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A remote URL passed through unchanged.
    Url(String),
    /// Raw bytes, already base64 encoded.
    Inline { media_type: String, data: String },
}

impl ImageSource {
    /// Encodes the source in the form the endpoint expects in `image_url.url`.
    pub fn to_url(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline { media_type, data } => {
                format!("data:{media_type};base64,{data}")
            }
        }
    }

    /// Inverse of [`ImageSource::to_url`].
    pub fn from_url(url: &str) -> Self {
        if let Some(rest) = url.strip_prefix("data:")
            && let Some((media_type, data)) = rest.split_once(";base64,")
        {
            return ImageSource::Inline {
                media_type: media_type.to_string(),
                data: data.to_string(),
            };
        }
        ImageSource::Url(url.to_string())
    }
}

/// The `image_url` object of an image content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub detail: ImageDetail,
}

impl ImageRef {
    pub fn new(source: &ImageSource, detail: ImageDetail) -> Self {
        Self {
            url: source.to_url(),
            detail,
        }
    }

    pub fn source(&self) -> ImageSource {
        ImageSource::from_url(&self.url)
    }
}

/// One element of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(source: &ImageSource, detail: ImageDetail) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageRef::new(source, detail),
        }
    }
}

/// Message body: either plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// Builds a user message with attached images.
    ///
    /// Without images this is an ordinary text message.
    pub fn user_with_images(text: impl Into<String>, images: Vec<ContentPart>) -> Self {
        let text = text.into();
        if images.is_empty() {
            return Self::user(text);
        }
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(ContentPart::text(text));
        parts.extend(images);
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// The instruction appended to a ledger to ask the model for a title.
    pub fn title_request(max_chars: usize) -> Self {
        Self::user(format!(
            "give a title for the previous prompt with a maximum character count of {max_chars}"
        ))
    }

    /// Text content of the message; for multipart messages the text parts
    /// joined by newlines.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn images(&self) -> Vec<&ImageRef> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ImageUrl { image_url } => Some(image_url),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}
