//! CLI command definitions.
//!
//! Each subcommand maps to one view of the console: the chat itself, the
//! dashboard feeds, account management and local settings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod account;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod storage;

/// Missionize - multi-agent consensus console
#[derive(Parser)]
#[command(name = "mz")]
#[command(version, about = "Missionize - multi-agent consensus console")]
#[command(long_about = r#"
Terminal console for the Missionize consensus API.

VIEWS:
  chat        → Interactive chat (fast or mission mode)
  models      → Models offered by the backend
  health      → Backend health and latency
  history     → Past missions
  pipeline    → Missions by stage (queued, running, completed, failed)
  patterns    → Learned mission patterns
  mizzi       → Mizzi QA agent status and recent events
  evidence    → Evidence records for completed missions
  profile     → Signed-in account
  keys        → API key management
  config      → Endpoint, credentials and display settings
  storage     → Inspect or clear locally stored data

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Cannot reach the API
  4 - API returned an error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the Missionize API
    #[arg(long, global = true, env = "MISSIONIZE_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding conversations and settings
    #[arg(long, global = true, env = "MISSIONIZE_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the backend
    Chat(chat::ChatArgs),

    /// List available models
    Models,

    /// Check backend health
    Health,

    /// Show mission history
    History,

    /// Show the mission pipeline
    Pipeline,

    /// Show learned patterns
    Patterns,

    /// Show Mizzi QA status
    Mizzi,

    /// Show evidence records
    Evidence(dashboard::EvidenceArgs),

    /// Show the signed-in account
    Profile,

    /// Manage API keys
    Keys(account::KeysArgs),

    /// Forget stored credentials
    Logout,

    /// Show or change settings
    Config(config::ConfigArgs),

    /// Inspect local storage
    Storage(storage::StorageArgs),
}
