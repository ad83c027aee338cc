//! # mz_chat - Chat session core for the Missionize console
//!
//! This crate drives a chat against the Missionize backend:
//! - Conversations persisted locally, most recent first
//! - **Fast mode**: single-model replies, streamed chunk by chunk
//! - **Mission mode**: multi-agent consensus with an evidence envelope
//! - File attachments staged for the next message
//! - A plain-text projection of conversations for terminal display
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   actions   ┌────────────────┐   requests   ┌──────────────────┐
//! │    Shell    │────────────▶│ ChatController │─────────────▶│ ConsensusBackend │
//! └─────────────┘             └───────┬────────┘              └──────────────────┘
//!        ▲                            │
//!        │ render / patch / settle    ├──▶ reducer (reply lifecycle)
//!        └────────────────────────────┤
//!                                     └──▶ LocalStore (one file per key)
//! ```

pub mod actions;
pub mod attachments;
pub mod backend;
pub mod controller;
pub mod error;
pub mod evidence;
pub mod reducer;
pub mod store;
pub mod types;
pub mod view;

pub use actions::*;
pub use attachments::*;
pub use backend::*;
pub use controller::*;
pub use error::*;
pub use reducer::{Disconnect, PendingReply, ReplyPhase};
pub use store::*;
pub use types::*;
pub use view::*;
