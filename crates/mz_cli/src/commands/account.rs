//! Account commands - Profile, API keys and sign-out.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use tracing::info;

use crate::context::Context;

#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    command: Option<KeysCommand>,
}

#[derive(Subcommand)]
enum KeysCommand {
    /// List API keys (default)
    List,

    /// Create a new API key
    Create {
        /// Label for the key
        name: String,

        /// Store the new key and use it for later requests
        #[arg(long)]
        save: bool,
    },

    /// Revoke an API key
    Delete {
        /// Key id as shown by `mz keys list`
        key_id: String,
    },
}

pub async fn profile(ctx: Context) -> Result<()> {
    let profile = ctx
        .client
        .profile()
        .await
        .context("Failed to load profile")?;

    println!("👤 {}", profile.email);
    println!("   Plan:   {}", profile.plan.as_deref().unwrap_or("free"));
    if let Some(created) = &profile.created_at {
        println!("   Since:  {}", created);
    }
    Ok(())
}

pub async fn keys(args: KeysArgs, ctx: Context) -> Result<()> {
    match args.command.unwrap_or(KeysCommand::List) {
        KeysCommand::List => {
            let keys = ctx
                .client
                .list_api_keys()
                .await
                .context("Failed to list API keys")?;
            if keys.is_empty() {
                println!("No API keys yet. Create one with `mz keys create NAME`.");
                return Ok(());
            }
            println!("🔑 API keys ({}):", keys.len());
            for key in keys {
                println!(
                    "  {:<12} {}…  {:<20} {}",
                    key.key_id,
                    key.key_prefix,
                    key.name.as_deref().unwrap_or("-"),
                    key.created_at.as_deref().unwrap_or("")
                );
            }
        }
        KeysCommand::Create { name, save } => {
            let created = ctx
                .client
                .create_api_key(&name)
                .await
                .context("Failed to create API key")?;
            info!(key_id = ?created.key_id, "API key created");

            println!(
                "✅ Created API key {} ({})",
                created.key_id.as_deref().unwrap_or("-"),
                name
            );
            println!();
            println!("   {}", created.key);
            println!();
            println!("⚠️  This is the only time the full key is shown. Store it safely.");
            if save {
                ctx.store.set_api_key(Some(created.key.as_str()))?;
                println!("💾 Saved as the default API key");
            }
        }
        KeysCommand::Delete { key_id } => {
            ctx.client
                .delete_api_key(&key_id)
                .await
                .context("Failed to delete API key")?;
            println!("🗑️  Deleted API key {}", key_id);
        }
    }
    Ok(())
}

pub fn logout(ctx: Context) -> Result<()> {
    ctx.store.logout()?;
    info!("Stored credentials removed");
    println!("👋 Signed out. Stored session token and API key removed.");
    Ok(())
}
