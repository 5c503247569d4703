//! Conversation state controller.
//!
//! Keeps the displayed transcript consistent with exactly one active
//! conversation (or a draft) and applies optimistic updates before the
//! server answers.
//!
//! # State machine
//!
//! ```text
//!   Draft ──first successful send──▶ Persisted(id)
//!     ▲                                  │
//!     │ new_chat                         │ select(other)
//!     │                                  ▼
//!     └──────────── any ◀── failure ── Loading(id) ──success──▶ Persisted(id)
//! ```
//!
//! A failed load reverts to whatever was active before the selection.
//!
//! # Stale responses
//!
//! Every selection and every new chat bumps a generation counter. Requests
//! remember the generation they started under and drop their result if it
//! no longer matches, so a slow response can never overwrite a newer
//! selection.

use crate::ports::chat_api::{ApiError, ChatApi, ChatReply};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{ChatProgress, NoProgress};
use empathy_domain::{ChatInput, ConversationId, HistoryEntry, Message};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Text of the synthetic reply appended when a send fails.
pub const SEND_FAILED_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Where the controller is in the conversation lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationPhase {
    /// No server id yet; empty or with turns not yet reloaded.
    Draft,
    /// Fetching the transcript of a selected conversation.
    Loading {
        id: ConversationId,
        previous: Box<ConversationPhase>,
    },
    /// Showing a conversation the server knows about.
    Persisted { id: ConversationId },
}

impl ConversationPhase {
    /// Id the UI should highlight as active.
    pub fn active_id(&self) -> Option<&ConversationId> {
        match self {
            ConversationPhase::Draft => None,
            ConversationPhase::Loading { id, .. } | ConversationPhase::Persisted { id } => Some(id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ConversationPhase::Loading { .. })
    }
}

/// Why a send was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyInput,
    InFlight,
    Loading,
}

/// Result of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was appended.
    Replied {
        conversation_id: ConversationId,
        /// The send created the conversation.
        created: bool,
    },
    /// The request failed; the apology reply was appended.
    Failed(ApiError),
    /// Nothing was sent and nothing changed.
    Rejected(SendRejection),
    /// The user moved to another conversation before the answer arrived.
    Superseded,
}

/// Result of selecting a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Loaded { message_count: usize },
    AlreadyActive,
    /// Loading failed; the previous selection is active again.
    Failed(ApiError),
    /// A newer selection replaced this one while it was loading.
    Stale,
}

/// Error left for the UI to show until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationError {
    pub conversation_id: ConversationId,
    pub message: String,
}

/// Read-only copy of the controller state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub active_id: Option<ConversationId>,
    pub loading: bool,
    pub sending: bool,
    pub messages: Vec<Message>,
    pub history: Vec<HistoryEntry>,
    pub input: String,
    pub last_error: Option<ConversationError>,
}

#[derive(Debug)]
struct ConversationState {
    phase: ConversationPhase,
    messages: Vec<Message>,
    history: Vec<HistoryEntry>,
    input: String,
    sending: bool,
    generation: u64,
    last_error: Option<ConversationError>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            phase: ConversationPhase::Draft,
            messages: Vec::new(),
            history: Vec::new(),
            input: String::new(),
            sending: false,
            generation: 0,
            last_error: None,
        }
    }
}

/// Clears the in-flight flag when the send finishes or is dropped.
struct InFlightGuard<'a> {
    state: &'a Mutex<ConversationState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sending = false;
    }
}

/// Source of a send: raw text, or the pending input buffer.
enum SendSource {
    Text(String),
    PendingInput,
}

/// Controller for the active conversation.
///
/// All methods take `&self`; the state lock is never held across a network
/// call, so the UI can keep reading snapshots while requests are pending.
pub struct ConversationController {
    api: Arc<dyn ChatApi>,
    conversation_logger: Arc<dyn ConversationLogger>,
    state: Mutex<ConversationState>,
}

impl ConversationController {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            conversation_logger: Arc::new(NoConversationLogger),
            state: Mutex::new(ConversationState::default()),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Queries ====================

    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.lock();
        ConversationSnapshot {
            active_id: state.phase.active_id().cloned(),
            loading: state.phase.is_loading(),
            sending: state.sending,
            messages: state.messages.clone(),
            history: state.history.clone(),
            input: state.input.clone(),
            last_error: state.last_error.clone(),
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        self.lock().phase.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.clone()
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        self.lock().phase.active_id().cloned()
    }

    pub fn is_sending(&self) -> bool {
        self.lock().sending
    }

    /// Return and dismiss the pending error, if any.
    pub fn take_error(&self) -> Option<ConversationError> {
        self.lock().last_error.take()
    }

    // ==================== Local mutations ====================

    pub fn set_input(&self, input: impl Into<String>) {
        self.lock().input = input.into();
    }

    /// Replace the history list, e.g. with the one loaded at sign-in.
    pub fn set_history(&self, history: Vec<HistoryEntry>) {
        self.lock().history = history;
    }

    /// Start a fresh draft. Does not contact the server.
    pub fn new_chat(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.phase = ConversationPhase::Draft;
        state.messages.clear();
        state.input.clear();
        state.last_error = None;
        debug!("New chat (generation {})", state.generation);
    }

    /// Drop everything, e.g. after sign-out.
    pub fn reset(&self) {
        let mut state = self.lock();
        let generation = state.generation + 1;
        *state = ConversationState {
            generation,
            ..ConversationState::default()
        };
    }

    // ==================== Server exchanges ====================

    /// Send one user turn. See [`send_with_progress`](Self::send_with_progress).
    pub async fn send(&self, text: impl Into<String>) -> SendOutcome {
        self.send_with_progress(text, &NoProgress).await
    }

    /// Send the pending input. The input is cleared only if the send is
    /// accepted.
    pub async fn submit(&self, progress: &dyn ChatProgress) -> SendOutcome {
        self.dispatch(SendSource::PendingInput, progress).await
    }

    /// Send one user turn.
    ///
    /// 1. Blank text, a send already in flight, or a conversation still
    ///    loading rejects the call without touching the transcript.
    /// 2. The user message is appended immediately.
    /// 3. On success the reply is appended; a draft adopts the returned id
    ///    and the history list is refreshed.
    /// 4. On failure a fixed apology is appended. Nothing is retried or
    ///    removed.
    pub async fn send_with_progress(
        &self,
        text: impl Into<String>,
        progress: &dyn ChatProgress,
    ) -> SendOutcome {
        self.dispatch(SendSource::Text(text.into()), progress).await
    }

    async fn dispatch(&self, source: SendSource, progress: &dyn ChatProgress) -> SendOutcome {
        let (input, conversation_id, generation, _guard) = {
            let mut state = self.lock();

            let text = match &source {
                SendSource::Text(text) => text.clone(),
                SendSource::PendingInput => state.input.clone(),
            };
            let input = match ChatInput::try_new(text) {
                Ok(input) => input,
                Err(_) => return SendOutcome::Rejected(SendRejection::EmptyInput),
            };
            if state.sending {
                debug!("Send rejected: another send is in flight");
                return SendOutcome::Rejected(SendRejection::InFlight);
            }
            if state.phase.is_loading() {
                debug!("Send rejected: conversation is loading");
                return SendOutcome::Rejected(SendRejection::Loading);
            }

            if let SendSource::PendingInput = source {
                state.input.clear();
            }
            state.sending = true;
            state.messages.push(Message::user(input.content()));

            (
                input,
                state.phase.active_id().cloned(),
                state.generation,
                InFlightGuard { state: &self.state },
            )
        };

        info!(
            "Sending message ({} bytes) to {}",
            input.content().len(),
            conversation_id
                .as_ref()
                .map(ConversationId::as_str)
                .unwrap_or("new conversation")
        );
        self.conversation_logger.log(ConversationEvent::new(
            "message_sent",
            serde_json::json!({
                "conversation_id": conversation_id.as_ref().map(ConversationId::as_str),
                "text": input.content(),
            }),
        ));

        progress.on_request_start("send_message");
        let result = self
            .api
            .send_message(&input, conversation_id.as_ref())
            .await;
        progress.on_request_end("send_message", result.is_ok());

        match result {
            Ok(reply) => {
                self.apply_reply(reply, conversation_id.is_none(), generation, progress)
                    .await
            }
            Err(error) => self.apply_failure(error, generation),
        }
    }

    async fn apply_reply(
        &self,
        reply: ChatReply,
        was_draft: bool,
        generation: u64,
        progress: &dyn ChatProgress,
    ) -> SendOutcome {
        self.conversation_logger.log(ConversationEvent::new(
            "reply_received",
            serde_json::json!({
                "conversation_id": reply.conversation_id.as_str(),
                "emotion": reply.detected_emotion,
                "bytes": reply.ai_response.len(),
                "text": reply.ai_response,
            }),
        ));

        let current = {
            let mut state = self.lock();
            if state.generation == generation {
                state.messages.push(Message::ai(reply.ai_response.as_str()));
                if was_draft {
                    state.phase = ConversationPhase::Persisted {
                        id: reply.conversation_id.clone(),
                    };
                }
                true
            } else {
                false
            }
        };

        if was_draft {
            info!("Conversation {} created", reply.conversation_id);
            self.refresh_history_with_progress(progress).await;
        }

        if current {
            SendOutcome::Replied {
                conversation_id: reply.conversation_id,
                created: was_draft,
            }
        } else {
            debug!(
                "Discarding reply for superseded conversation {}",
                reply.conversation_id
            );
            SendOutcome::Superseded
        }
    }

    fn apply_failure(&self, error: ApiError, generation: u64) -> SendOutcome {
        warn!("Failed to send message: {}", error);
        self.conversation_logger.log(ConversationEvent::new(
            "send_failed",
            serde_json::json!({ "error": error.to_string() }),
        ));

        let mut state = self.lock();
        if state.generation != generation {
            return SendOutcome::Superseded;
        }
        state.messages.push(Message::ai(SEND_FAILED_REPLY));
        SendOutcome::Failed(error)
    }

    /// Make a history entry the active conversation.
    pub async fn select(&self, id: ConversationId) -> SelectOutcome {
        self.select_with_progress(id, &NoProgress).await
    }

    /// Make a history entry the active conversation.
    ///
    /// On success the message list is replaced wholesale. On failure the
    /// previous selection and transcript stay active and the error is kept
    /// for [`take_error`](Self::take_error).
    pub async fn select_with_progress(
        &self,
        id: ConversationId,
        progress: &dyn ChatProgress,
    ) -> SelectOutcome {
        let generation = {
            let mut state = self.lock();
            if state.phase.active_id() == Some(&id) {
                return SelectOutcome::AlreadyActive;
            }
            let previous = match std::mem::replace(&mut state.phase, ConversationPhase::Draft) {
                // A superseded load reverts to what was active before it.
                ConversationPhase::Loading { previous, .. } => previous,
                phase => Box::new(phase),
            };
            state.generation += 1;
            state.phase = ConversationPhase::Loading {
                id: id.clone(),
                previous,
            };
            state.last_error = None;
            state.generation
        };

        debug!("Loading conversation {} (generation {})", id, generation);
        progress.on_request_start("fetch_conversation");
        let result = self.api.fetch_conversation(&id).await;
        progress.on_request_end("fetch_conversation", result.is_ok());

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding stale load of conversation {}", id);
            return SelectOutcome::Stale;
        }

        match result {
            Ok(messages) => {
                let message_count = messages.len();
                state.messages = messages;
                state.phase = ConversationPhase::Persisted { id: id.clone() };
                drop(state);

                info!("Loaded conversation {} ({} messages)", id, message_count);
                self.conversation_logger.log(ConversationEvent::new(
                    "conversation_loaded",
                    serde_json::json!({
                        "conversation_id": id.as_str(),
                        "messages": message_count,
                    }),
                ));
                SelectOutcome::Loaded { message_count }
            }
            Err(error) => {
                warn!("Failed to fetch conversation {}: {}", id, error);
                let previous = match std::mem::replace(&mut state.phase, ConversationPhase::Draft)
                {
                    ConversationPhase::Loading { previous, .. } => *previous,
                    phase => phase,
                };
                state.phase = previous;
                state.last_error = Some(ConversationError {
                    conversation_id: id,
                    message: load_error_message(&error),
                });
                SelectOutcome::Failed(error)
            }
        }
    }

    /// Re-fetch the history list. Failures keep the current list.
    pub async fn refresh_history(&self) -> Result<usize, ApiError> {
        self.refresh_history_inner(&NoProgress).await
    }

    async fn refresh_history_with_progress(&self, progress: &dyn ChatProgress) {
        if let Err(e) = self.refresh_history_inner(progress).await {
            warn!("Failed to refresh history: {}", e);
        }
    }

    async fn refresh_history_inner(&self, progress: &dyn ChatProgress) -> Result<usize, ApiError> {
        progress.on_request_start("fetch_history");
        let result = self.api.fetch_history().await;
        progress.on_request_end("fetch_history", result.is_ok());

        let history = result?;
        let count = history.len();
        self.lock().history = history;
        debug!("History refreshed ({} entries)", count);
        Ok(count)
    }
}

fn load_error_message(error: &ApiError) -> String {
    match error {
        ApiError::NotFound(_) => "That conversation could not be found.".to_string(),
        ApiError::Auth { .. } => "You are not allowed to open that conversation.".to_string(),
        _ => "Could not load that conversation. Please try again.".to_string(),
    }
}
