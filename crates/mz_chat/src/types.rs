//! Core types for the chat console.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mz_api::{AgentDecision, MissionResponse, ModelOption};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Unique identifier for a conversation
pub type ConversationId = String;

/// Title given to conversations before their first message
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Model selected when nothing is stored
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Content prefix marking an assistant reply that has not landed yet
pub const PENDING_MARKER: &str = "⏳";

/// Longest title derived from a first message, in characters
pub const TITLE_MAX_CHARS: usize = 50;

/// Models offered when the backend catalogue is unavailable.
pub fn fallback_models() -> Vec<ModelOption> {
    vec![
        ModelOption::new("gpt-4o-mini", "GPT-4o Mini", "OpenAI"),
        ModelOption::new("gpt-4o", "GPT-4o", "OpenAI"),
        ModelOption::new("claude-sonnet-4", "Claude Sonnet 4", "Anthropic"),
    ]
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Backend execution path for a send
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Direct single-model completion, optionally streamed
    #[default]
    Fast,
    /// Multi-agent consensus returning an evidence envelope
    Mission,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Mission => "mission",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "mission" => Ok(Self::Mission),
            other => Err(ChatError::UnknownMode(other.to_string())),
        }
    }
}

/// Mizzi QA status shown on assistant replies.
///
/// Unrecognised values from the backend are kept as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MizziStatus {
    Passed,
    Completed,
    Failed,
    Pending,
    Error,
    Blocked,
}

impl MizziStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Error => "error",
            Self::Blocked => "blocked",
        }
    }

    /// Parse a backend value, defaulting to `Completed` when absent.
    pub fn from_backend(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::from(v.to_string()),
            _ => Self::Completed,
        }
    }
}

impl From<String> for MizziStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "passed" => Self::Passed,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            "blocked" => Self::Blocked,
            _ => Self::Pending,
        }
    }
}

impl From<MizziStatus> for String {
    fn from(status: MizziStatus) -> Self {
        status.as_str().to_string()
    }
}

/// File reference recorded on a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
}

/// Consensus evidence attached to a mission-mode reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceData {
    #[serde(default)]
    pub mission_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub agent_decisions: BTreeMap<String, AgentDecision>,
    #[serde(default)]
    pub evidence_hash: Option<String>,
    #[serde(default)]
    pub trust_score: Option<f64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    pub timestamp: String,
    #[serde(default)]
    pub guardian_approved: Option<bool>,
}

impl EvidenceData {
    pub fn from_envelope(envelope: &MissionResponse, received_at: DateTime<Utc>) -> Self {
        Self {
            mission_id: envelope.mission_id.clone(),
            status: envelope.status.clone(),
            agent_decisions: envelope.agent_decisions.clone(),
            evidence_hash: envelope.evidence_hash.clone(),
            trust_score: envelope.trust_score,
            confidence_score: envelope.confidence_score,
            timestamp: envelope
                .timestamp
                .clone()
                .unwrap_or_else(|| received_at.to_rfc3339()),
            guardian_approved: envelope.guardian_approved,
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Message content
    pub content: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// Files attached to a user message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef>,
    /// Model that produced an assistant reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "missionId", default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(rename = "mizziStatus", default, skip_serializing_if = "Option::is_none")]
    pub mizzi_status: Option<MizziStatus>,
    #[serde(rename = "filesGenerated", default, skip_serializing_if = "Option::is_none")]
    pub files_generated: Option<u32>,
    #[serde(rename = "evidenceData", default, skip_serializing_if = "Option::is_none")]
    pub evidence_data: Option<EvidenceData>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>, files: Vec<FileRef>, now: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: now,
            files,
            model: None,
            mission_id: None,
            mizzi_status: None,
            files_generated: None,
            evidence_data: None,
        }
    }

    /// Create an assistant placeholder awaiting the backend reply
    pub fn assistant_placeholder(model: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            content: format!("{} Sending to Missionize backend...", PENDING_MARKER),
            timestamp: now,
            files: Vec::new(),
            model: Some(model.into()),
            mission_id: None,
            mizzi_status: None,
            files_generated: None,
            evidence_data: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_pending(&self) -> bool {
        self.content.starts_with(PENDING_MARKER)
    }
}

/// A conversation with its message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: format!("conv-{}", uuid::Uuid::new_v4().simple()),
            title: NEW_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
            message_count: conversation.messages.len(),
            updated_at: conversation.updated_at,
        }
    }
}
