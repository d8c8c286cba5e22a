//! Scripted completion client shared by the conversation tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hey_core::completion::{CompletionClient, CompletionRequest, DeltaSink};
use hey_core::error::{HeyError, Result};
use hey_infrastructure::HeyPaths;
use tempfile::TempDir;

use super::manager::ConversationManager;

/// Answers requests from a fixed script, in order, and records every
/// request it receives.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub(crate) fn with_replies(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HeyError::transport(None, "script exhausted")))
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.next_reply(request)
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        sink: &mut dyn DeltaSink,
    ) -> Result<String> {
        let text = self.next_reply(request)?;
        for delta in text.split_inclusive(' ') {
            sink.on_delta(delta);
        }
        Ok(text)
    }
}

pub(crate) fn manager(temp_dir: &TempDir, client: Arc<ScriptedClient>) -> ConversationManager {
    ConversationManager::with_json_storage(HeyPaths::new(temp_dir.path()), client, "nvim").unwrap()
}
