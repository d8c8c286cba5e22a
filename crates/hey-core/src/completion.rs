//! Port to the remote chat-completion endpoint.
//!
//! The core only needs two things from the remote side: a complete answer for
//! a message list, or the same answer delivered as incremental fragments.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::message::Message;

/// Everything sent for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Sampling temperature, 0.0..=2.0.
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Receives streamed text fragments in arrival order, each exactly once.
pub trait DeltaSink: Send {
    fn on_delta(&mut self, delta: &str);
}

impl<F> DeltaSink for F
where
    F: FnMut(&str) + Send,
{
    fn on_delta(&mut self, delta: &str) {
        self(delta)
    }
}

/// A chat-completion backend.
///
/// Both methods return either the full assistant text or an error; partial
/// streamed text is never returned on failure.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the request and waits for a single JSON envelope.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Sends the request with streaming enabled, forwarding each delta to
    /// `sink` as it arrives.
    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        sink: &mut dyn DeltaSink,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest::new("gpt-4o", vec![Message::user("hi")])
            .with_temperature(0.5)
            .with_max_tokens(256);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5,
                "max_tokens": 256
            })
        );
    }

    #[test]
    fn test_temperature_is_clamped() {
        let request = CompletionRequest::new("m", vec![]).with_temperature(5.0);
        assert_eq!(request.temperature, 2.0);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |delta: &str| seen.push(delta.to_string());
            let sink: &mut dyn DeltaSink = &mut sink;
            sink.on_delta("a");
            sink.on_delta("b");
        }
        assert_eq!(seen, vec!["a", "b"]);
    }
}
