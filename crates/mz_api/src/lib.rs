//! # mz_api - Missionize consensus API client
//!
//! Thin typed client for the hosted Missionize API:
//! - JSON `POST`/`GET`/`DELETE` with per-call authentication
//! - Chat event streams (server-sent events) for fast-mode replies
//! - Mission-mode consensus runs bounded by a client-side deadline
//! - Dashboard feeds with sample-data fallback
//!
//! Failures are normalised into [`ApiError`], whose display text is meant
//! to be shown to the user unchanged.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod samples;
pub mod sse;
pub mod types;

pub use client::*;
pub use config::*;
pub use dashboard::*;
pub use error::*;
pub use sse::*;
pub use types::*;
