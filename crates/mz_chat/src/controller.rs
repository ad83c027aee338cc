//! Chat session controller.
//!
//! Owns the conversation list, model catalogue, mode and staged files, and
//! runs each send through the reply lifecycle in [`crate::reducer`]. Only
//! one send is in flight at a time; a second send while a reply is pending
//! is ignored.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::StreamExt;
use mz_api::{ChatSendRequest, ChatTurn, MissionRequest, ModelOption, StreamEvent};
use tracing::{debug, info, warn};

use crate::attachments::StagedFile;
use crate::backend::ConsensusBackend;
use crate::error::{ChatError, ChatResult};
use crate::reducer::{self, Disconnect, PendingReply, ReplyPhase};
use crate::store::LocalStore;
use crate::types::{
    fallback_models, ChatMode, Conversation, ConversationId, ConversationSummary, FileRef,
    DEFAULT_MODEL,
};
use crate::view::ViewSink;

/// Result of [`ChatController::send_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// No text and no staged files
    Empty,
    /// A previous reply is still in flight
    Busy,
    /// The reply reached a terminal phase
    Replied {
        conversation_id: ConversationId,
        phase: ReplyPhase,
    },
}

struct ConsoleState {
    conversations: Vec<Conversation>,
    current: ConversationId,
    models: Vec<ModelOption>,
    selected_model: String,
    mode: ChatMode,
    staged: Vec<StagedFile>,
}

impl ConsoleState {
    fn find(&self, id: &str) -> ChatResult<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    fn find_mut(&mut self, id: &str) -> ChatResult<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }
}

/// Clears the in-flight flag when the send finishes, however it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Main chat controller
pub struct ChatController<B, V> {
    backend: B,
    view: V,
    store: LocalStore,
    state: Mutex<ConsoleState>,
    in_flight: AtomicBool,
}

impl<B: ConsensusBackend, V: ViewSink> ChatController<B, V> {
    /// Load stored state, refresh the model catalogue and render the current
    /// conversation.
    ///
    /// A fresh conversation is created when none are stored. If the backend
    /// offers a model list that lacks the stored selection, the first model
    /// is selected and persisted.
    pub async fn mount(backend: B, view: V, store: LocalStore) -> ChatResult<Self> {
        let mut conversations = store.load_conversations()?;
        if conversations.is_empty() {
            conversations.push(Conversation::new(Utc::now()));
            store.save_conversations(&conversations)?;
        }
        let current = conversations[0].id.clone();
        let mode = store.load_chat_mode()?;
        let mut selected_model = store
            .load_selected_model()?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let models = match backend.list_models().await {
            Ok(models) if !models.is_empty() => {
                if !models.iter().any(|m| m.id == selected_model) {
                    selected_model = models[0].id.clone();
                    store.save_selected_model(&selected_model)?;
                    debug!(model = %selected_model, "stored model unavailable, selected first offered");
                }
                models
            }
            Ok(_) => fallback_models(),
            Err(e) => {
                warn!(error = %e, "could not load models, using fallback list");
                fallback_models()
            }
        };

        info!(
            conversations = conversations.len(),
            %mode,
            model = %selected_model,
            "chat mounted"
        );

        let controller = Self {
            backend,
            view,
            store,
            state: Mutex::new(ConsoleState {
                conversations,
                current,
                models,
                selected_model,
                mode,
                staged: Vec::new(),
            }),
            in_flight: AtomicBool::new(false),
        };
        controller.render_current()?;
        Ok(controller)
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) -> ChatResult<()> {
        let state = self.lock();
        self.store.save_conversations(&state.conversations)
    }

    fn render_current(&self) -> ChatResult<()> {
        let (conversation, models) = {
            let state = self.lock();
            (state.find(&state.current)?.clone(), state.models.clone())
        };
        self.view.render(&conversation, &models);
        Ok(())
    }

    fn update<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Conversation) -> ChatResult<T>,
    ) -> ChatResult<T> {
        let mut state = self.lock();
        apply(state.find_mut(id)?)
    }

    // -------------------------------------------------------------------
    // Sending
    // -------------------------------------------------------------------

    /// Send the input with any staged files.
    ///
    /// Appends the user message and an assistant placeholder, then runs the
    /// current mode until the reply settles. Request failures become an
    /// error reply rather than an `Err`; `Err` is reserved for local
    /// problems such as an unwritable store.
    pub async fn send_message(&self, input: &str) -> ChatResult<SendOutcome> {
        let text = input.trim();
        if text.is_empty() && self.lock().staged.is_empty() {
            return Ok(SendOutcome::Empty);
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("send ignored, reply still in flight");
            return Ok(SendOutcome::Busy);
        };

        let now = Utc::now();
        let (conversation_id, mode, model, staged) = {
            let mut state = self.lock();
            let staged = std::mem::take(&mut state.staged);
            let files = staged.iter().map(StagedFile::file_ref).collect();
            let current = state.current.clone();
            reducer::push_user_message(state.find_mut(&current)?, text, files, now);
            (current, state.mode, state.selected_model.clone(), staged)
        };
        self.persist()?;
        self.render_current()?;

        let (mut pending, history) = {
            let mut state = self.lock();
            let conversation = state.find_mut(&conversation_id)?;
            let mut pending = reducer::push_placeholder(conversation, &model, now);
            reducer::begin(
                &mut pending,
                match mode {
                    ChatMode::Fast => ReplyPhase::Streaming,
                    ChatMode::Mission => ReplyPhase::AwaitingConsensus,
                },
            )?;
            (pending, reducer::request_history(conversation))
        };
        self.persist()?;
        self.render_current()?;

        info!(conversation = %conversation_id, %mode, %model, files = staged.len(), "sending message");
        let result = match mode {
            ChatMode::Fast => {
                self.run_fast(&conversation_id, &mut pending, history, &model)
                    .await
            }
            ChatMode::Mission => {
                self.run_mission(&conversation_id, &mut pending, text, history, &staged)
                    .await
            }
        };

        match result {
            Ok(()) => {}
            Err(ChatError::Api(err)) => {
                warn!(error = %err, "send failed");
                let base_url = self.backend.base_url();
                self.update(&conversation_id, |c| {
                    reducer::apply_failure(c, &mut pending, &err.to_string(), &base_url)
                })?;
            }
            Err(other) => return Err(other),
        }

        self.persist()?;
        self.settle(&conversation_id, &pending);
        debug!(phase = ?pending.phase(), "reply settled");

        Ok(SendOutcome::Replied {
            conversation_id,
            phase: pending.phase(),
        })
    }

    async fn run_fast(
        &self,
        conversation_id: &str,
        pending: &mut PendingReply,
        history: Vec<ChatTurn>,
        model: &str,
    ) -> ChatResult<()> {
        let request = ChatSendRequest {
            messages: history,
            model_id: model.to_string(),
            conversation_id: conversation_id.to_string(),
        };
        let response = self.backend.send_chat(request).await?;

        let Some(message_id) = response.stream_message_id() else {
            return self.update(conversation_id, |c| {
                reducer::apply_immediate(c, pending, &response)
            });
        };

        debug!(%message_id, "subscribing to reply stream");
        let mut events = match self.backend.open_stream(message_id).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "could not open reply stream");
                return self.update(conversation_id, |c| {
                    reducer::apply_disconnect(c, pending, Disconnect::Unreachable)
                });
            }
        };

        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Chunk(text) => {
                    let (content, visible) = {
                        let mut state = self.lock();
                        let conversation = state.find_mut(conversation_id)?;
                        let content = reducer::apply_chunk(conversation, pending, &text)?.to_string();
                        (content, state.current == conversation_id)
                    };
                    if visible {
                        self.view.patch_last_assistant(&content);
                    }
                }
                StreamEvent::Final(event) => {
                    self.update(conversation_id, |c| reducer::apply_final(c, pending, &event))?;
                    break;
                }
                StreamEvent::BackendError(payload) => {
                    warn!(error = ?payload.error, code = ?payload.error_code, "backend reported stream error");
                    self.update(conversation_id, |c| {
                        reducer::apply_backend_stream_error(c, pending, &payload)
                    })?;
                    break;
                }
                StreamEvent::Disconnected(reason) => {
                    warn!(%reason, "reply stream disconnected");
                    self.update(conversation_id, |c| {
                        reducer::apply_disconnect(c, pending, Disconnect::Lost)
                    })?;
                    break;
                }
            }
        }

        if !pending.phase().is_terminal() {
            warn!("reply stream ended without a final event");
            self.update(conversation_id, |c| {
                reducer::apply_disconnect(c, pending, Disconnect::Lost)
            })?;
        }
        Ok(())
    }

    async fn run_mission(
        &self,
        conversation_id: &str,
        pending: &mut PendingReply,
        task: &str,
        history: Vec<ChatTurn>,
        staged: &[StagedFile],
    ) -> ChatResult<()> {
        let files = staged.iter().map(StagedFile::payload).collect();
        let request = MissionRequest::new(task, history, files);
        let envelope = self.backend.run_mission(request).await?;

        info!(
            mission = ?envelope.mission_id,
            status = %envelope.status,
            approved = ?envelope.guardian_approved,
            "mission finished"
        );
        self.update(conversation_id, |c| {
            reducer::apply_mission(c, pending, &envelope, Utc::now())
        })
    }

    fn settle(&self, conversation_id: &str, pending: &PendingReply) {
        let settled = {
            let state = self.lock();
            if state.current != conversation_id {
                None
            } else {
                state
                    .find(conversation_id)
                    .ok()
                    .and_then(|c| c.messages.get(pending.index()).cloned())
                    .map(|m| (m, state.models.clone()))
            }
        };
        if let Some((message, models)) = settled {
            self.view.settle_last_assistant(&message, &models);
        }
    }

    /// Whether a reply is still in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------
    // Conversations
    // -------------------------------------------------------------------

    /// Start an empty conversation at the top of the list and open it.
    pub fn new_conversation(&self) -> ChatResult<ConversationId> {
        let conversation = Conversation::new(Utc::now());
        let id = conversation.id.clone();
        {
            let mut state = self.lock();
            state.conversations.insert(0, conversation);
            state.current = id.clone();
        }
        self.persist()?;
        self.render_current()?;
        info!(conversation = %id, "new conversation");
        Ok(id)
    }

    pub fn open_conversation(&self, id: &str) -> ChatResult<()> {
        {
            let mut state = self.lock();
            state.find(id)?;
            state.current = id.to_string();
        }
        self.render_current()
    }

    /// Stored conversations, most recent first
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.lock()
            .conversations
            .iter()
            .map(ConversationSummary::from)
            .collect()
    }

    pub fn current_conversation(&self) -> ChatResult<Conversation> {
        let state = self.lock();
        state.find(&state.current).cloned()
    }

    // -------------------------------------------------------------------
    // Model and mode
    // -------------------------------------------------------------------

    pub fn models(&self) -> Vec<ModelOption> {
        self.lock().models.clone()
    }

    pub fn selected_model(&self) -> String {
        self.lock().selected_model.clone()
    }

    pub fn select_model(&self, model_id: &str) -> ChatResult<()> {
        {
            let mut state = self.lock();
            if !state.models.iter().any(|m| m.id == model_id) {
                return Err(ChatError::UnknownModel(model_id.to_string()));
            }
            state.selected_model = model_id.to_string();
        }
        self.store.save_selected_model(model_id)?;
        info!(model = %model_id, "model selected");
        Ok(())
    }

    pub fn mode(&self) -> ChatMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: ChatMode) -> ChatResult<()> {
        self.lock().mode = mode;
        self.store.save_chat_mode(mode)?;
        info!(%mode, "chat mode changed");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Attachments
    // -------------------------------------------------------------------

    /// Stage a file from disk for the next send.
    pub fn attach_file(&self, path: impl AsRef<Path>) -> ChatResult<FileRef> {
        let file = StagedFile::from_path(path)?;
        Ok(self.stage(file))
    }

    pub fn attach_bytes(&self, name: &str, bytes: &[u8]) -> ChatResult<FileRef> {
        let file = StagedFile::from_bytes(name, bytes)?;
        Ok(self.stage(file))
    }

    fn stage(&self, file: StagedFile) -> FileRef {
        let file_ref = file.file_ref();
        self.lock().staged.push(file);
        file_ref
    }

    /// Unstage the file at a zero-based position.
    pub fn remove_file(&self, index: usize) -> ChatResult<FileRef> {
        let mut state = self.lock();
        if index >= state.staged.len() {
            return Err(ChatError::NoSuchAttachment(index));
        }
        Ok(state.staged.remove(index).file_ref())
    }

    pub fn staged_files(&self) -> Vec<FileRef> {
        self.lock().staged.iter().map(StagedFile::file_ref).collect()
    }
}
