//! Brace - cookie-keyed HTTP sessions
//!
//! Main entry point for the `brace-session` CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, keygen, purge, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Brace - cookie-keyed HTTP sessions with file and cookie storage
#[derive(Parser)]
#[command(name = "brace-session")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of discovering one
    #[arg(short, long, global = true, env = "BRACE_SESSION_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the session server
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Delete expired sessions from file storage
    Purge(purge::PurgeArgs),

    /// Generate a base64 key for encrypted cookie storage
    Keygen,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "brace=debug,brace_session=debug,brace_server=debug,brace_config=debug,tower_http=debug,info"
    } else {
        "brace=info,brace_session=info,brace_server=info,warn"
    };

    let log_dir = brace_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "brace-session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "brace=trace,brace_session=trace,brace_server=trace,brace_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        config_file: cli.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Purge(args) => purge::run(args, &ctx).await,
        Commands::Keygen => keygen::run(&ctx).await,
    }
}
