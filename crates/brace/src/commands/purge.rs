//! Purge command - deletes expired session files.

use std::path::PathBuf;

use anyhow::{Result, bail};
use brace_config::StorageConfig;
use brace_session::FileStorage;
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use super::Context;

/// Arguments for the purge command.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Session directory (overrides config)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PurgeOutput {
    dir: PathBuf,
    removed: usize,
}

/// Run the purge command.
pub async fn run(args: PurgeArgs, ctx: &Context) -> Result<()> {
    let dir = match args.storage_dir {
        Some(dir) => dir,
        None => {
            let storage = ctx.load_config()?.config.storage();
            match (&storage, storage.file_dir()) {
                (StorageConfig::File { .. }, Some(dir)) => dir,
                _ => bail!(
                    "purge only applies to the file backend (configured: {})",
                    storage.backend()
                ),
            }
        }
    };

    let storage = FileStorage::new(&dir);
    let removed = storage.purge_expired(chrono::Utc::now().timestamp()).await?;
    info!(dir = %dir.display(), removed, "Purged expired sessions");

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&PurgeOutput { dir, removed })?
        );
    } else {
        println!(
            "{} Removed {} expired session(s) from {}",
            style("✓").green(),
            removed,
            dir.display()
        );
    }

    Ok(())
}
