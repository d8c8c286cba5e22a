//! Markdown rendering of a conversation.
//!
//! The transcript is a pure function of the stored record: a title heading,
//! a date sub-heading, then one `### Role` block per message.

use chrono::NaiveDateTime;

use crate::message::{ContentPart, ImageSource, Message, MessageContent};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn title_block(title: &str) -> String {
    let title = title.trim().trim_matches('"');
    let mut chars = title.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("# {capitalized}\n\n")
}

pub fn date_block(date: &NaiveDateTime) -> String {
    format!("## {}\n\n", date.format(DATE_FORMAT))
}

pub fn message_block(message: &Message) -> String {
    let body = match &message.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.clone(),
                ContentPart::ImageUrl { image_url } => match image_url.source() {
                    ImageSource::Url(url) => format!("![image]({url})"),
                    ImageSource::Inline { media_type, .. } => {
                        format!("_[inline image: {media_type}]_")
                    }
                },
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    };
    format!("### {}\n{}\n\n", message.role.display_name(), body.trim_end())
}

/// Renders the whole transcript. The header is only emitted when both a title
/// and a start date are known.
pub fn render(title: Option<&str>, start_date: Option<&NaiveDateTime>, messages: &[Message]) -> String {
    let mut out = String::new();
    if let (Some(title), Some(start)) = (title, start_date) {
        out.push_str(&title_block(title));
        out.push_str(&date_block(start));
    }
    for message in messages {
        out.push_str(&message_block(message));
    }
    out
}
