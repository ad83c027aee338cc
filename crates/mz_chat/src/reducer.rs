//! Pure state transitions for a conversation.
//!
//! Every assistant reply starts as a placeholder and moves through
//! [`ReplyPhase`] until it reaches a terminal phase:
//!
//! ```text
//! Placeholder ─┬─> Streaming ──────────┬─> Completed
//!              │                       └─> Error
//!              └─> AwaitingConsensus ──┬─> Completed
//!                                      ├─> Blocked
//!                                      └─> Error
//! ```
//!
//! The functions here only touch the conversation value; persistence and
//! rendering are left to the controller.

use chrono::{DateTime, Utc};
use mz_api::{ChatSendResponse, ChatTurn, FinalEvent, MissionResponse, StreamErrorPayload};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::evidence;
use crate::types::{
    Conversation, EvidenceData, FileRef, Message, MizziStatus, Role, NEW_CHAT_TITLE,
    TITLE_MAX_CHARS,
};

/// Lifecycle phase of an assistant reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPhase {
    Placeholder,
    Streaming,
    AwaitingConsensus,
    Completed,
    Blocked,
    Error,
}

impl ReplyPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Blocked | Self::Error)
    }

    pub fn can_advance_to(&self, next: ReplyPhase) -> bool {
        use ReplyPhase::*;
        matches!(
            (self, next),
            (Placeholder, Streaming)
                | (Placeholder, AwaitingConsensus)
                | (Streaming, Streaming)
                | (Streaming, Completed)
                | (Streaming, Error)
                | (AwaitingConsensus, Completed)
                | (AwaitingConsensus, Blocked)
                | (AwaitingConsensus, Error)
        )
    }
}

/// Tracks the assistant message a send is filling in.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    index: usize,
    phase: ReplyPhase,
    accumulated: String,
}

impl PendingReply {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> ReplyPhase {
        self.phase
    }

    fn advance(&mut self, next: ReplyPhase) -> ChatResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(ChatError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

fn reply_mut<'a>(
    conversation: &'a mut Conversation,
    pending: &PendingReply,
) -> ChatResult<&'a mut Message> {
    conversation
        .messages
        .get_mut(pending.index)
        .filter(|m| m.role == Role::Assistant)
        .ok_or(ChatError::ReplyMissing(pending.index))
}

/// Title derived from a first message
pub fn derive_title(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return NEW_CHAT_TITLE.to_string();
    }
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Append a user message, naming the conversation if it was empty.
pub fn push_user_message(
    conversation: &mut Conversation,
    text: &str,
    files: Vec<FileRef>,
    now: DateTime<Utc>,
) {
    if conversation.messages.is_empty() {
        conversation.title = derive_title(text);
    }
    conversation.messages.push(Message::user(text, files, now));
    conversation.updated_at = now;
}

/// Append the assistant placeholder for a send.
pub fn push_placeholder(
    conversation: &mut Conversation,
    model: &str,
    now: DateTime<Utc>,
) -> PendingReply {
    conversation
        .messages
        .push(Message::assistant_placeholder(model, now));
    conversation.updated_at = now;
    PendingReply {
        index: conversation.messages.len() - 1,
        phase: ReplyPhase::Placeholder,
        accumulated: String::new(),
    }
}

/// Move a placeholder into `Streaming` or `AwaitingConsensus`.
pub fn begin(pending: &mut PendingReply, phase: ReplyPhase) -> ChatResult<()> {
    match phase {
        ReplyPhase::Streaming | ReplyPhase::AwaitingConsensus
            if pending.phase == ReplyPhase::Placeholder =>
        {
            pending.advance(phase)
        }
        _ => Err(ChatError::InvalidTransition {
            from: pending.phase,
            to: phase,
        }),
    }
}

/// Append a streamed chunk; the message holds everything received so far.
pub fn apply_chunk<'a>(
    conversation: &mut Conversation,
    pending: &'a mut PendingReply,
    text: &str,
) -> ChatResult<&'a str> {
    pending.advance(ReplyPhase::Streaming)?;
    pending.accumulated.push_str(text);
    reply_mut(conversation, pending)?.content = pending.accumulated.clone();
    Ok(&pending.accumulated)
}

/// Close a stream with the backend's final event.
pub fn apply_final(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    event: &FinalEvent,
) -> ChatResult<()> {
    pending.advance(ReplyPhase::Completed)?;
    let content = pending.accumulated.clone();
    let message = reply_mut(conversation, pending)?;
    message.content = content;
    message.mission_id = event.mission_id.clone();
    message.mizzi_status = Some(MizziStatus::from_backend(event.mizzi_status.as_deref()));
    message.files_generated = event.files_generated;
    Ok(())
}

/// Fill the reply from a send response that carried its content inline.
pub fn apply_immediate(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    response: &ChatSendResponse,
) -> ChatResult<()> {
    pending.advance(ReplyPhase::Completed)?;
    let message = reply_mut(conversation, pending)?;
    message.content = response.text().unwrap_or("Response received.").to_string();
    message.mission_id = response.mission_id.clone();
    message.mizzi_status = Some(MizziStatus::from_backend(response.mizzi_status.as_deref()));
    message.files_generated = response.files_generated;
    Ok(())
}

/// The stream carried a backend error payload.
pub fn apply_backend_stream_error(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    payload: &StreamErrorPayload,
) -> ChatResult<()> {
    pending.advance(ReplyPhase::Error)?;
    let message = reply_mut(conversation, pending)?;
    message.content = format!(
        "**Error from backend:** {}\n\nError code: {}",
        payload.error.as_deref().unwrap_or("Unknown error"),
        payload.error_code.as_deref().unwrap_or("UNKNOWN")
    );
    message.mizzi_status = Some(MizziStatus::Error);
    Ok(())
}

/// How a reply stream went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The stream could not be opened
    Unreachable,
    /// The stream opened, then broke or closed early
    Lost,
}

impl Disconnect {
    fn message(self) -> &'static str {
        match self {
            Self::Unreachable => "**Connection error.** Could not connect to streaming endpoint.",
            Self::Lost => "**Streaming error.** Connection lost.",
        }
    }
}

/// The stream broke. Whatever arrived is kept as the reply.
pub fn apply_disconnect(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    kind: Disconnect,
) -> ChatResult<()> {
    if pending.accumulated.is_empty() {
        pending.advance(ReplyPhase::Error)?;
        let message = reply_mut(conversation, pending)?;
        message.content = kind.message().to_string();
        message.mizzi_status = Some(MizziStatus::Error);
    } else {
        pending.advance(ReplyPhase::Completed)?;
        let content = pending.accumulated.clone();
        let message = reply_mut(conversation, pending)?;
        message.content = content;
        message.mizzi_status = Some(MizziStatus::Completed);
    }
    Ok(())
}

/// Reconcile a consensus envelope into the reply.
pub fn apply_mission(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    envelope: &MissionResponse,
    now: DateTime<Utc>,
) -> ChatResult<()> {
    let blocked = evidence::is_blocked(envelope);
    pending.advance(if blocked {
        ReplyPhase::Blocked
    } else {
        ReplyPhase::Completed
    })?;

    let message = reply_mut(conversation, pending)?;
    if blocked {
        message.content = evidence::explain_block(envelope);
        message.mizzi_status = Some(MizziStatus::Blocked);
    } else {
        message.content = evidence::summarize_approved(envelope);
        message.mizzi_status = Some(match envelope.status.to_ascii_lowercase().as_str() {
            "failed" | "rejected" => MizziStatus::Failed,
            _ if envelope.guardian_approved == Some(true) => MizziStatus::Passed,
            _ => MizziStatus::Completed,
        });
    }
    message.mission_id = envelope.mission_id.clone();
    message.evidence_data = Some(EvidenceData::from_envelope(envelope, now));
    Ok(())
}

/// The request failed outright. The reply becomes an error with hints.
pub fn apply_failure(
    conversation: &mut Conversation,
    pending: &mut PendingReply,
    error: &str,
    base_url: &str,
) -> ChatResult<()> {
    pending.advance(ReplyPhase::Error)?;
    let message = reply_mut(conversation, pending)?;
    message.content = format!(
        "**Error:** {}\n\nPlease check:\n• Is the backend running?\n• Is the API URL correct? ({})\n• Run with --verbose for details",
        error, base_url
    );
    message.mizzi_status = Some(MizziStatus::Error);
    message.evidence_data = None;
    Ok(())
}

/// History sent to the backend: every settled message with content.
pub fn request_history(conversation: &Conversation) -> Vec<ChatTurn> {
    conversation
        .messages
        .iter()
        .filter(|m| !m.content.trim().is_empty() && !m.is_pending())
        .map(|m| ChatTurn::new(m.role.as_str(), m.content.clone()))
        .collect()
}
