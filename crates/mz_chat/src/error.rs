//! Error types for the chat system.

use thiserror::Error;

use crate::reducer::ReplyPhase;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat system errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// Conversation id not present in the stored list
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Model id not offered by the catalogue
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Chat mode string not recognised
    #[error("Unknown chat mode: {0} (expected 'fast' or 'mission')")]
    UnknownMode(String),

    /// Attachment exceeds the per-file cap
    #[error("File \"{name}\" is too large. Maximum size is 10MB.")]
    FileTooLarge { name: String, size: u64 },

    /// No staged attachment at this position
    #[error("No attached file at position {0}")]
    NoSuchAttachment(usize),

    /// Action name not handled by the dispatcher
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Action recognised but its argument is missing or malformed
    #[error("Invalid argument for action '{action}': {reason}")]
    InvalidAction { action: String, reason: String },

    /// Pending reply no longer points at an assistant message
    #[error("No assistant reply at message {0}")]
    ReplyMissing(usize),

    /// Reply lifecycle transition not allowed
    #[error("Invalid reply transition: {from:?} -> {to:?}")]
    InvalidTransition { from: ReplyPhase, to: ReplyPhase },

    /// Backend request failed
    #[error(transparent)]
    Api(#[from] mz_api::ApiError),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
