//! Missionize console - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Cannot reach the API
//! - 4: API returned an error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

mod commands;
mod context;
mod terminal;

use commands::{Cli, Commands};
use context::Context;
use mz_api::ApiError;
use mz_chat::ChatError;

/// Script-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONNECTION_ERROR: u8 = 3;
    pub const API_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "mz=debug" } else { "mz=info" };
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into());
    let filter = match level.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match Context::resolve(&cli) {
        Ok(ctx) => run(cli.command, ctx).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

async fn run(command: Commands, ctx: Context) -> anyhow::Result<()> {
    match command {
        Commands::Chat(args) => commands::chat::execute(args, ctx).await,
        Commands::Models => commands::chat::list_models(ctx).await,
        Commands::Health => commands::dashboard::health(ctx).await,
        Commands::History => commands::dashboard::history(ctx).await,
        Commands::Pipeline => commands::dashboard::pipeline(ctx).await,
        Commands::Patterns => commands::dashboard::patterns(ctx).await,
        Commands::Mizzi => commands::dashboard::mizzi(ctx).await,
        Commands::Evidence(args) => commands::dashboard::evidence(args, ctx).await,
        Commands::Profile => commands::account::profile(ctx).await,
        Commands::Keys(args) => commands::account::keys(args, ctx).await,
        Commands::Logout => commands::account::logout(ctx),
        Commands::Config(args) => commands::config::execute(args, ctx),
        Commands::Storage(args) => commands::storage::execute(args, ctx),
    }
}

/// Map an error chain to an exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        let api = cause.downcast_ref::<ApiError>().or_else(|| {
            cause.downcast_ref::<ChatError>().and_then(|c| match c {
                ChatError::Api(api) => Some(api),
                _ => None,
            })
        });
        if let Some(api) = api {
            return if api.is_connect() {
                ExitCodes::CONNECTION_ERROR
            } else {
                ExitCodes::API_ERROR
            };
        }
        if let Some(chat) = cause.downcast_ref::<ChatError>() {
            return match chat {
                ChatError::UnknownModel(_)
                | ChatError::UnknownMode(_)
                | ChatError::UnknownAction(_)
                | ChatError::InvalidAction { .. }
                | ChatError::NoSuchAttachment(_)
                | ChatError::ConversationNotFound(_)
                | ChatError::FileTooLarge { .. } => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}
