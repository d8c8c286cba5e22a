//! OpenAIApiAgent - direct REST implementation of the completion port for
//! OpenAI-compatible chat endpoints.

use async_trait::async_trait;
use futures::StreamExt;
use hey_core::completion::{CompletionClient, CompletionRequest, DeltaSink};
use hey_core::error::{HeyError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::sse::{LineBuffer, SseAccumulator};

/// Agent implementation that talks to the chat-completions HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    config: ApiConfig,
}

impl OpenAIApiAgent {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Builds an agent from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn try_from_env() -> Result<Self> {
        Ok(Self::new(ApiConfig::from_env()?))
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url)
    }

    async fn post_chat(&self, body: &ChatCompletionBody<'_>) -> Result<Response> {
        tracing::debug!(
            model = %body.request.model,
            stream = body.stream,
            messages = body.request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| HeyError::transport(None, format!("request failed: {err}")))?;

        ensure_success(response).await
    }

    /// Ids of the chat models the endpoint offers (those starting with `gpt`),
    /// sorted.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.models_url())
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|err| HeyError::transport(None, format!("request failed: {err}")))?;
        let body = read_body(ensure_success(response).await?).await?;

        let parsed: ModelList = parse_envelope(&body)?;
        let mut ids: Vec<String> = parsed
            .data
            .into_iter()
            .map(|model| model.id)
            .filter(|id| id.starts_with("gpt"))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CompletionClient for OpenAIApiAgent {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionBody {
            request,
            stream: false,
        };
        let response = self.post_chat(&body).await?;
        let text = read_body(response).await?;

        let parsed: ChatCompletionResponse = parse_envelope(&text)?;
        extract_text_response(parsed, &text)
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        sink: &mut dyn DeltaSink,
    ) -> Result<String> {
        let body = ChatCompletionBody {
            request,
            stream: true,
        };
        let response = self.post_chat(&body).await?;

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::new();
        let mut accumulator = SseAccumulator::new();

        'read: while let Some(chunk) = stream.next().await {
            let bytes = chunk
                .map_err(|err| HeyError::transport(None, format!("stream interrupted: {err}")))?;
            for line in lines.push(&bytes) {
                accumulator.feed_line(&line, sink)?;
                if accumulator.is_done() {
                    break 'read;
                }
            }
        }
        if !accumulator.is_done() {
            if let Some(rest) = lines.finish() {
                accumulator.feed_line(&rest, sink)?;
            }
        }

        Ok(accumulator.finish())
    }
}

/// Request body: the completion request plus the streaming flag.
#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    #[serde(flatten)]
    request: &'a CompletionRequest,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Turns a non-success status into a transport error before anything tries to
/// interpret the body.
async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(status, body))
}

async fn read_body(response: Response) -> Result<String> {
    response
        .text()
        .await
        .map_err(|err| HeyError::transport(None, format!("failed to read response body: {err}")))
}

/// Body that is not JSON is a parse error; JSON of the wrong shape is a
/// schema error. Both keep the raw body.
fn parse_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|err| HeyError::parse(format!("response is not JSON: {err}"), body))?;
    serde_json::from_value(value)
        .map_err(|err| HeyError::schema(format!("unexpected response shape: {err}"), body))
}

fn extract_text_response(response: ChatCompletionResponse, body: &str) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| HeyError::schema("response has no choices[0].message.content", body))
}

/// The error keeps the body untouched; the API's own message is only logged.
fn map_http_error(status: StatusCode, body: String) -> HeyError {
    if let Ok(wrapper) = serde_json::from_str::<ErrorResponse>(&body) {
        tracing::warn!(status = status.as_u16(), "API error: {}", wrapper.error.message);
    }
    HeyError::transport(Some(status.as_u16()), body)
}
