//! Serve command - runs the session server.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use brace_config::StorageConfig;
use brace_server::{AppState, Server, ServerConfig};
use brace_session::SessionManager;
use clap::Args;
use tracing::info;

use super::{Context, build_storage, session_config};

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Keep sessions as files in this directory (selects the file backend)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Disable per-request logging
    #[arg(long)]
    pub quiet_requests: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = loaded.config;

    let server_section = config.server();
    let bind = args.bind.unwrap_or(server_section.bind);
    let port = args.port.unwrap_or(server_section.port);
    let bind_address: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", bind, port))?;

    let storage_config = match args.storage_dir {
        Some(dir) => StorageConfig::File { dir: Some(dir) },
        None => config.storage(),
    };

    let sessions_config = session_config(&config.session())?;
    let storage = build_storage(&storage_config, &sessions_config)?;

    if ctx.verbose {
        for source in loaded.sources.iter().filter(|s| s.loaded) {
            info!(path = %source.path.display(), "Loaded config");
        }
    }
    info!(
        backend = storage_config.backend(),
        cookie = %sessions_config.cookie_name,
        ttl_secs = sessions_config.ttl_secs(),
        expires_secs = sessions_config.expires_secs(),
        "Session storage ready"
    );
    if let Some(dir) = storage_config.file_dir() {
        info!(dir = %dir.display(), "File storage directory");
    }

    let sessions = SessionManager::from_shared(storage, sessions_config);
    let server_config = ServerConfig::new()
        .with_bind_address(bind_address)
        .with_request_logging(server_section.request_logging && !args.quiet_requests);

    Server::new(AppState::new(sessions, server_config))
        .run()
        .await?;

    Ok(())
}
