//! Error types for hey.

use thiserror::Error;

/// A shared error type for the whole workspace.
///
/// Remote failures are split three ways so callers can tell "we never got a
/// usable reply" (`Transport`) from "the reply was not JSON" (`Parse`) from
/// "the JSON did not have the expected shape" (`Schema`). Each carries the raw
/// body for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeyError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error of local state
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error (missing credential, bad directory, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request failed or the server answered with a non-success status.
    #[error("Transport error{}: {body}", status_suffix(.status))]
    Transport { status: Option<u16>, body: String },

    /// The response body (or one streamed line) was not valid JSON.
    #[error("Parse error: {message}\n{body}")]
    Parse { message: String, body: String },

    /// The response JSON did not contain the expected fields.
    #[error("Unrecognized response: {message}\n{body}")]
    Schema { message: String, body: String },

    /// No list entry matched the given token.
    #[error("No close matches found for '{0}'")]
    NoMatch(String),

    /// A numeric token pointed outside the list.
    #[error("Invalid index {index} (list has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// User-correctable input error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn transport(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    pub fn parse(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn schema(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// True for any failure that came from talking to the completion endpoint.
    pub fn is_remote(&self) -> bool {
        self.is_transport() || self.is_parse() || self.is_schema()
    }

    /// True for list-resolution failures the user can fix by retyping.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::NoMatch(_) | Self::IndexOutOfRange { .. } | Self::InvalidInput(_)
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for HeyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for HeyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// A type alias for `Result<T, HeyError>`.
pub type Result<T> = std::result::Result<T, HeyError>;
