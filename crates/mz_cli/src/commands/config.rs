//! Config command - Show and change saved settings.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use tracing::info;

use mz_chat::{LocalStore, UiToggle};

use crate::context::Context;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective settings (default)
    Show,

    /// Save an API base URL override
    SetUrl {
        /// Base URL, e.g. http://localhost:8000
        url: String,
    },

    /// Save the API key sent with every request
    SetKey { key: String },

    /// Save a session token
    SetToken { token: String },

    /// Turn a display setting on or off
    Toggle {
        /// enterprise-mode, multiworker-view or mizzi-indicators
        name: String,

        /// on or off
        value: String,
    },

    /// Forget the URL override and display settings
    Reset,
}

pub fn execute(args: ConfigArgs, ctx: Context) -> Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => show(&ctx)?,
        ConfigCommand::SetUrl { url } => {
            let url = url.trim().trim_end_matches('/');
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("API URL must start with http:// or https://");
            }
            ctx.store.set_api_url(Some(url))?;
            info!(%url, "API URL saved");
            println!("✅ API URL set to {}", url);
        }
        ConfigCommand::SetKey { key } => {
            ctx.store.set_api_key(Some(key.as_str()))?;
            println!("✅ API key saved ({})", mask(&key));
        }
        ConfigCommand::SetToken { token } => {
            ctx.store.set_token(Some(token.as_str()))?;
            println!("✅ Session token saved");
        }
        ConfigCommand::Toggle { name, value } => {
            let Some(toggle) = UiToggle::parse(&name) else {
                bail!(
                    "Unknown setting '{}'. Expected one of: {}",
                    name,
                    toggle_names().join(", ")
                );
            };
            let enabled = parse_switch(&value)?;
            ctx.store.set_toggle(toggle, enabled)?;
            println!("✅ {} {}", toggle.key(), if enabled { "on" } else { "off" });
        }
        ConfigCommand::Reset => {
            ctx.store.reset_settings()?;
            println!("✅ Settings reset to defaults");
        }
    }
    Ok(())
}

fn show(ctx: &Context) -> Result<()> {
    let config = ctx.client.config();
    println!("⚙️  Settings ({})", ctx.store.root().display());
    println!("   API URL:        {} ({})", config.base_url, ctx.url_source);
    println!(
        "   API key:        {}",
        config.api_key.as_deref().map(mask).unwrap_or_else(|| "not set".into())
    );
    println!(
        "   Session token:  {}",
        if config.bearer_token.is_some() { "set" } else { "not set" }
    );
    println!("   Mission timeout: {}s", config.mission_timeout.as_secs());
    println!("   Chat mode:      {}", ctx.store.load_chat_mode()?);
    println!(
        "   Model:          {}",
        ctx.store
            .load_selected_model()?
            .unwrap_or_else(|| mz_chat::DEFAULT_MODEL.to_string())
    );
    print_toggles(&ctx.store)
}

fn print_toggles(store: &LocalStore) -> Result<()> {
    for toggle in UiToggle::ALL {
        let state = if store.toggle(toggle)? { "on" } else { "off" };
        println!("   {:<24} {}", toggle.key(), state);
    }
    Ok(())
}

fn toggle_names() -> Vec<String> {
    UiToggle::ALL
        .iter()
        .map(|t| {
            t.key()
                .trim_start_matches("enable_")
                .trim_start_matches("show_")
                .replace('_', "-")
        })
        .collect()
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("Expected on or off, got '{}'", other),
    }
}

/// Show only the start of a secret
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    if secret.chars().count() > 8 {
        format!("{}…", visible)
    } else {
        "••••".to_string()
    }
}
