//! ConversationManager: one turn from prompt to transcript.

use std::sync::Arc;

use hey_core::completion::{CompletionClient, CompletionRequest, DeltaSink};
use hey_core::context::{
    Context, ContextField, ContextRepository, ContextStore, generate_convo_id, now,
    validate_convo_id,
};
use hey_core::error::{HeyError, Result};
use hey_core::message::{ContentPart, ImageSource, Message};
use hey_core::registry::{Registry, RegistryField, RegistryRepository, RegistryStore};
use hey_infrastructure::transcript_writer::{mk_prompt_path, write_transcript};
use hey_infrastructure::{HeyPaths, JsonContextRepository, JsonRegistryRepository};

/// Model used for title derivation and quick prompts.
pub const TITLE_MODEL: &str = "gpt-4o-mini";

/// Maximum title length requested from the model.
pub const TITLE_MAX_LENGTH: usize = 64;

/// Appended to the system prompt while the codify flag is on.
pub const CODIFY_INSTRUCTION: &str =
    "Reply with code only: no explanations, no prose, no markdown fences.";

const FALLBACK_TITLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One user turn as asked for by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
    /// Replaces the stored system prompt for this request only.
    pub system: Option<String>,
    /// Number of oldest outbound entries left out of the request.
    pub trim: usize,
    pub images: Vec<ImageSource>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_trim(mut self, trim: usize) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_images(mut self, images: Vec<ImageSource>) -> Self {
        self.images = images;
        self
    }
}

/// Owns the registry, the active conversation and the completion client.
pub struct ConversationManager {
    pub(super) paths: HeyPaths,
    pub(super) contexts: Arc<dyn ContextRepository>,
    pub(super) registry: RegistryStore,
    pub(super) context: ContextStore,
    pub(super) client: Arc<dyn CompletionClient>,
    pub(super) defaults: Registry,
}

impl ConversationManager {
    /// Loads the registry (initializing it from `defaults` if absent) and the
    /// active conversation it points to.
    pub fn open(
        paths: HeyPaths,
        contexts: Arc<dyn ContextRepository>,
        registry: Arc<dyn RegistryRepository>,
        client: Arc<dyn CompletionClient>,
        defaults: Registry,
    ) -> Result<Self> {
        let registry = RegistryStore::open(registry, defaults.clone())?;
        let context = ContextStore::open(contexts.clone(), registry.record().convo())?;
        tracing::debug!(
            convo = registry.record().convo(),
            dir = %paths.prompts_dir().display(),
            "Opened conversation"
        );
        Ok(Self {
            paths,
            contexts,
            registry,
            context,
            client,
            defaults,
        })
    }

    /// Opens a manager backed by JSON files in `paths`, creating the
    /// directory if needed.
    pub fn with_json_storage(
        paths: HeyPaths,
        client: Arc<dyn CompletionClient>,
        editor: &str,
    ) -> Result<Self> {
        paths.ensure_dir()?;
        let contexts = Arc::new(JsonContextRepository::new(paths.clone()));
        let registry = Arc::new(JsonRegistryRepository::new(&paths));
        let defaults = Registry::with_defaults(paths.prompts_dir(), editor);
        Self::open(paths, contexts, registry, client, defaults)
    }

    pub fn paths(&self) -> &HeyPaths {
        &self.paths
    }

    pub fn registry(&self) -> &Registry {
        self.registry.record()
    }

    pub fn context(&self) -> &Context {
        self.context.record()
    }

    /// Id of the active conversation.
    pub fn convo(&self) -> &str {
        self.context.convo()
    }

    /// Applies one registry setting and saves it.
    pub fn update_registry(&mut self, field: RegistryField) -> Result<()> {
        self.registry.update(field)
    }

    /// Replaces the stored system prompt of the active conversation.
    pub fn set_system_prompt(&mut self, system: impl Into<String>) -> Result<()> {
        self.context
            .update(ContextField::SystemPrompt(system.into()))
    }

    /// The user message for `request`, images attached at the configured
    /// detail level.
    pub fn user_message(&self, request: &PromptRequest) -> Message {
        let detail = self.registry.record().detail();
        let images = request
            .images
            .iter()
            .map(|source| ContentPart::image(source, detail))
            .collect();
        Message::user_with_images(request.prompt.clone(), images)
    }

    /// System prompt as sent: the override or the stored prompt, plus the
    /// code-only instruction when codify is on.
    pub fn effective_system_prompt(&self, system: Option<&str>) -> String {
        let mut prompt = system
            .unwrap_or(self.context.record().system_prompt())
            .to_string();
        if self.registry.record().codify() {
            if !prompt.is_empty() {
                prompt.push(' ');
            }
            prompt.push_str(CODIFY_INSTRUCTION);
        }
        prompt
    }

    /// `[system] + stored messages + [user]`, minus the first `trim` entries.
    /// The system entry is left out when the prompt is empty.
    pub fn outbound_messages(&self, user: &Message, system: Option<&str>, trim: usize) -> Vec<Message> {
        let system = self.effective_system_prompt(system);
        let stored = self.context.messages();

        let mut messages = Vec::with_capacity(stored.len() + 2);
        if !system.is_empty() {
            messages.push(Message::system(system));
        }
        messages.extend(stored.iter().cloned());
        messages.push(user.clone());

        messages.into_iter().skip(trim).collect()
    }

    fn completion_request(&self, model: &str, messages: Vec<Message>) -> CompletionRequest {
        let registry = self.registry.record();
        CompletionRequest::new(model, messages)
            .with_temperature(registry.temperature())
            .with_max_tokens(registry.max_tokens())
    }

    /// Sends `user` with the stored history and returns the assistant reply.
    /// Nothing is stored.
    ///
    /// With a sink the request is streamed and every delta is forwarded as it
    /// arrives.
    pub async fn fetch_prompt_with_context(
        &self,
        user: &Message,
        system: Option<&str>,
        trim: usize,
        sink: Option<&mut dyn DeltaSink>,
    ) -> Result<Message> {
        let messages = self.outbound_messages(user, system, trim);
        let request = self.completion_request(self.registry.record().model(), messages);
        let text = match sink {
            Some(sink) => self.client.complete_streaming(&request, sink).await?,
            None => self.client.complete(&request).await?,
        };
        Ok(Message::assistant(text))
    }

    /// Runs one full turn: fetch, then [`add_prompts`](Self::add_prompts).
    ///
    /// If the request fails, the user message and an `Error: ...` assistant
    /// message are still stored before the error is returned.
    pub async fn ask(
        &mut self,
        request: &PromptRequest,
        sink: Option<&mut dyn DeltaSink>,
    ) -> Result<Message> {
        let user = self.user_message(request);
        match self
            .fetch_prompt_with_context(&user, request.system.as_deref(), request.trim, sink)
            .await
        {
            Ok(assistant) => {
                self.add_prompts(user, assistant.clone()).await?;
                Ok(assistant)
            }
            Err(err) => {
                self.record_failed_turn(user, &err)?;
                Err(err)
            }
        }
    }

    /// Appends a completed turn, derives the title if due, assigns the
    /// transcript path on first use, stamps the dates and rewrites the
    /// transcript.
    ///
    /// The conversation file is saved before the transcript is touched.
    pub async fn add_prompts(&mut self, user: Message, assistant: Message) -> Result<()> {
        self.context.append([user, assistant])?;
        let slug = self.check_and_set_smart_title().await?;

        if self.context.record().transcript_path().is_none() {
            let stem = if slug.is_empty() {
                self.context.convo().to_string()
            } else {
                slug
            };
            let path = mk_prompt_path(self.paths.prompts_dir(), &stem);
            self.context.update(ContextField::TranscriptPath(path))?;
        }

        self.context.update(ContextField::EndDate(now()))?;
        if self.context.record().start_date().is_none() {
            self.context.update(ContextField::StartDate(now()))?;
        }

        write_transcript(self.context.record())
    }

    /// Stores a turn that never got a reply.
    pub fn record_failed_turn(&mut self, user: Message, error: &HeyError) -> Result<()> {
        tracing::warn!("Recording failed turn: {}", error);
        self.context
            .append([user, Message::assistant(format!("Error: {error}"))])
    }

    /// Derives and stores a title when one is due. Returns the current slug,
    /// empty if there is none.
    pub async fn check_and_set_smart_title(&mut self) -> Result<String> {
        if self.context.record().needs_title() {
            let title = self.conjure_smart_title(TITLE_MAX_LENGTH).await;
            self.context.update(ContextField::Title(title))?;
        }
        Ok(self
            .context
            .record()
            .title_slug()
            .unwrap_or_default()
            .to_string())
    }

    /// Asks the title model for a title. Never fails: on any error the first
    /// `max_length` characters of the last message are used, or today's date
    /// when there are no messages.
    pub async fn conjure_smart_title(&self, max_length: usize) -> String {
        let messages = self.context.messages();
        let fallback = fallback_title(messages, max_length);

        let mut ledger = messages.to_vec();
        ledger.push(Message::title_request(max_length));
        let request = self.completion_request(TITLE_MODEL, ledger);

        match self.client.complete(&request).await {
            Ok(reply) => {
                let title = clean_title(&reply);
                if title.is_empty() {
                    tracing::warn!("Title model returned an empty title, using fallback");
                    fallback
                } else {
                    title
                }
            }
            Err(err) => {
                tracing::warn!("Title derivation failed, using fallback: {}", err);
                fallback
            }
        }
    }

    /// Removes the last user/assistant pair and returns the user text, for a
    /// retry.
    pub fn pop_user_prompt(&mut self) -> Result<Option<String>> {
        self.context.pop_user_prompt()
    }

    /// Creates a fresh empty conversation `convo`, or one under a generated id
    /// when `None`, and makes it active. An id that is already stored is
    /// refused; use [`switch_context`](Self::switch_context) for those.
    pub fn new_context(&mut self, convo: Option<&str>) -> Result<String> {
        let existing = self.contexts.list_ids()?;
        let convo = match convo {
            Some(convo) => {
                if existing.iter().any(|id| id == convo) {
                    return Err(HeyError::invalid_input(format!(
                        "conversation '{convo}' already exists"
                    )));
                }
                convo.to_string()
            }
            None => std::iter::repeat_with(generate_convo_id)
                .find(|id| !existing.contains(id))
                .ok_or_else(|| HeyError::internal("no free conversation id"))?,
        };
        validate_convo_id(&convo)?;

        let context = ContextStore::create(self.contexts.clone(), &convo)?;
        self.registry.update(RegistryField::Convo(convo.clone()))?;
        self.context = context;
        tracing::info!("Started conversation '{}'", convo);
        Ok(convo)
    }

    /// Makes the stored conversation `convo` active, loading its history. A
    /// missing record is initialized empty.
    pub fn switch_context(&mut self, convo: &str) -> Result<()> {
        let context = ContextStore::open(self.contexts.clone(), convo)?;
        self.registry.update(RegistryField::Convo(convo.to_string()))?;
        self.context = context;
        tracing::info!("Switched to conversation '{}'", convo);
        Ok(())
    }

    /// Starts a new conversation only if the active one has completed a
    /// turn. Returns the new id, or `None` when the active one was kept.
    pub fn make_new(&mut self) -> Result<Option<String>> {
        if self.context.record().end_date().is_none() {
            return Ok(None);
        }
        self.new_context(None).map(Some)
    }

    /// Sends a single message with no stored history and stores nothing.
    pub async fn one_shot(
        &self,
        prompt: &str,
        model: Option<&str>,
        sink: Option<&mut dyn DeltaSink>,
    ) -> Result<String> {
        let model = model.unwrap_or(self.registry.record().model()).to_string();
        let request = self.completion_request(&model, vec![Message::user(prompt)]);
        match sink {
            Some(sink) => self.client.complete_streaming(&request, sink).await,
            None => self.client.complete(&request).await,
        }
    }
}

fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches(['"', '\'']).trim().to_string()
}

fn fallback_title(messages: &[Message], max_length: usize) -> String {
    match messages.last() {
        Some(last) => {
            let text = last.text();
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let title: String = collapsed.chars().take(max_length).collect();
            if title.is_empty() {
                now().format(FALLBACK_TITLE_DATE_FORMAT).to_string()
            } else {
                title
            }
        }
        None => now().format(FALLBACK_TITLE_DATE_FORMAT).to_string(),
    }
}
