//! Chat command - Talk to the consensus backend.
//!
//! Without `--message` this opens an interactive session; lines starting
//! with `/` are console actions, anything else is sent as a message.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use mz_api::ApiClient;
use mz_chat::{
    dispatch, format_file_size, model_name, Action, ActionEffect, ChatController, ChatMode,
    ReplyPhase, Route, SendOutcome, UiToggle,
};

use crate::context::Context;
use crate::terminal::TerminalView;

type Console = ChatController<ApiClient, TerminalView>;

#[derive(Args)]
pub struct ChatArgs {
    /// Reply mode: fast (single model, streamed) or mission (consensus)
    #[arg(long)]
    mode: Option<ChatMode>,

    /// Model to use for fast mode
    #[arg(long)]
    model: Option<String>,

    /// Send a single message and exit
    #[arg(short, long)]
    message: Option<String>,

    /// Attach a file to the first message (repeatable)
    #[arg(short, long = "attach")]
    attach: Vec<PathBuf>,
}

const HELP: &str = r#"Commands:
  /new                 Start a new conversation
  /list                List conversations
  /open ID             Switch to a conversation
  /model ID            Select a model
  /mode fast|mission   Switch reply mode
  /attach PATH         Stage a file for the next message
  /remove N            Unstage the Nth file
  /suggest N           Use a suggested prompt
  /view-mission ID     Show where to follow a mission
  /view-evidence ID    Show where to find mission evidence
  /help                Show this help
  /quit                Leave the chat"#;

pub async fn execute(args: ChatArgs, ctx: Context) -> Result<()> {
    let show_status = ctx.store.toggle(UiToggle::MizziIndicators)?;
    let controller = ChatController::mount(ctx.client, TerminalView::stdout(show_status), ctx.store)
        .await
        .context("Failed to start chat")?;

    if let Some(mode) = args.mode {
        controller.set_mode(mode)?;
    }
    if let Some(model) = &args.model {
        controller.select_model(model)?;
    }
    for path in &args.attach {
        let file = controller
            .attach_file(path)
            .with_context(|| format!("Failed to attach {}", path.display()))?;
        println!("📎 Attached {} ({})", file.name, format_file_size(file.size));
    }

    match args.message {
        Some(message) => send_once(&controller, &message).await,
        None => interactive(&controller).await,
    }
}

async fn send_once(controller: &Console, message: &str) -> Result<()> {
    match controller.send_message(message).await? {
        SendOutcome::Empty => anyhow::bail!("Nothing to send: the message is empty"),
        SendOutcome::Replied {
            phase: ReplyPhase::Error,
            ..
        } => anyhow::bail!("The backend did not produce a reply"),
        _ => Ok(()),
    }
}

async fn interactive(controller: &Console) -> Result<()> {
    let models = controller.models();
    println!();
    println!(
        "💬 Missionize chat · mode: {} · model: {}",
        controller.mode(),
        model_name(&controller.selected_model(), &models)
    );
    println!("   Type /help for commands, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut prefill: Option<String> = None;

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        let input = match (line, prefill.take()) {
            ("", Some(prompt)) => prompt,
            ("/quit" | "/exit", _) => break,
            ("/help", _) => {
                println!("{}", HELP);
                continue;
            }
            (line, _) => line.to_string(),
        };

        let action = match Action::from_input(&input) {
            Ok(action) => action,
            Err(e) => {
                println!("❌ {}", e);
                continue;
            }
        };

        match dispatch(controller, action).await {
            Ok(ActionEffect::Prefill(prompt)) => {
                println!("✏️  {}", prompt);
                println!("   Press Enter to send it, or type something else.");
                prefill = Some(prompt);
            }
            Ok(effect) => report(controller, effect),
            Err(e) => println!("❌ {}", e),
        }
    }

    info!("chat session closed");
    Ok(())
}

fn report(controller: &Console, effect: ActionEffect) {
    match effect {
        ActionEffect::Sent(SendOutcome::Empty) => println!("ℹ️  Nothing to send."),
        ActionEffect::Sent(SendOutcome::Busy) => {
            println!("⏳ Still waiting for the previous reply.")
        }
        ActionEffect::Sent(SendOutcome::Replied { .. }) => {}
        ActionEffect::ConversationOpened(_) => {}
        ActionEffect::Conversations(list) => {
            let current = controller.current_conversation().ok().map(|c| c.id);
            println!("📋 Conversations:");
            for summary in list {
                let marker = if current.as_deref() == Some(summary.id.as_str()) {
                    "▶"
                } else {
                    " "
                };
                println!(
                    "  {} {}  {} ({} messages, {})",
                    marker,
                    summary.id,
                    summary.title,
                    summary.message_count,
                    summary.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        ActionEffect::ModelSelected(id) => {
            println!("✅ Model: {}", model_name(&id, &controller.models()))
        }
        ActionEffect::ModeChanged(mode) => match mode {
            ChatMode::Fast => println!("✅ Fast mode: single model, streamed replies"),
            ChatMode::Mission => {
                println!("✅ Mission mode: multi-agent consensus with evidence")
            }
        },
        ActionEffect::FileAttached(file) => {
            println!("📎 Attached {} ({})", file.name, format_file_size(file.size))
        }
        ActionEffect::FileRemoved(file) => println!("🗑️  Removed {}", file.name),
        ActionEffect::Navigate(Route::Mission(id)) => {
            println!("🔎 Mission {}: run `mz pipeline` to follow it", id)
        }
        ActionEffect::Navigate(Route::Evidence(id)) => {
            println!("🔒 Evidence for {}: run `mz evidence {}`", id, id)
        }
        ActionEffect::Prefill(prompt) => println!("✏️  {}", prompt),
    }
}

/// List the models the backend offers.
pub async fn list_models(ctx: Context) -> Result<()> {
    let models = ctx
        .client
        .list_models()
        .await
        .context("Failed to load models")?;
    let selected = ctx.store.load_selected_model()?;

    println!("📋 Available models ({}):", models.len());
    for model in &models {
        let marker = if selected.as_deref() == Some(model.id.as_str()) {
            "▶"
        } else {
            " "
        };
        match &model.provider {
            Some(provider) => println!("  {} {:<24} {} · {}", marker, model.id, model.name, provider),
            None => println!("  {} {:<24} {}", marker, model.id, model.name),
        }
    }
    Ok(())
}
