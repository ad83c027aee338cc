//! Storage command - Inspect or wipe locally stored data.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::warn;

use mz_chat::format_file_size;

use crate::context::Context;

#[derive(Args)]
pub struct StorageArgs {
    #[command(subcommand)]
    command: Option<StorageCommand>,
}

#[derive(Subcommand)]
enum StorageCommand {
    /// List stored keys and their sizes (default)
    List,

    /// Delete all conversations, credentials and settings
    Clear {
        /// Required to actually delete
        #[arg(long)]
        yes: bool,
    },
}

pub fn execute(args: StorageArgs, ctx: Context) -> Result<()> {
    match args.command.unwrap_or(StorageCommand::List) {
        StorageCommand::List => {
            let entries = ctx.store.entries()?;
            println!("📁 {}", ctx.store.root().display());
            if entries.is_empty() {
                println!("   (empty)");
            }
            let total: u64 = entries.iter().map(|(_, size)| size).sum();
            for (key, size) in &entries {
                println!("   {:<32} {}", key, format_file_size(*size));
            }
            if !entries.is_empty() {
                println!("   {:<32} {}", "total", format_file_size(total));
            }
        }
        StorageCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("This deletes every conversation and saved credential. Re-run with --yes to confirm.");
            }
            let removed = ctx.store.clear()?;
            warn!(removed, "Local storage cleared");
            println!("🗑️  Removed {} stored item(s)", removed);
        }
    }
    Ok(())
}
