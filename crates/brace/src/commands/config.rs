//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use brace_config::{BraceConfig, StorageConfig};
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./brace-session.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx).await,
        ConfigCommand::Which => cmd_which(ctx).await,
        ConfigCommand::Init { local } => cmd_init(local).await,
        ConfigCommand::Path => cmd_path().await,
    }
}

/// Fully-populated config with the cookie key masked.
fn resolved(config: &BraceConfig) -> BraceConfig {
    let storage = match config.storage() {
        StorageConfig::Cookie { cookie_name, key } => StorageConfig::Cookie {
            cookie_name,
            key: key.map(|_| "<redacted>".to_string()),
        },
        other => other,
    };

    BraceConfig {
        server: Some(config.server()),
        session: Some(config.session()),
        storage: Some(storage),
    }
}

async fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = resolved(&loaded.config);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("# Brace Session Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let server = config.server();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!("  request logging: {}", server.request_logging);
    println!();

    let session = config.session();
    println!("Session:");
    println!("  cookie: {} (path {})", session.cookie_name, session.cookie_path);
    println!("  ttl: {}s, expires: {}s", session.ttl_secs, session.expires_secs);
    println!(
        "  secure: {}, same_site: {:?}",
        session.secure, session.same_site
    );
    println!();

    let storage = config.storage();
    println!("Storage:");
    println!("  backend: {}", storage.backend());
    match &storage {
        StorageConfig::File { .. } => {
            if let Some(dir) = storage.file_dir() {
                println!("  dir: {}", dir.display());
            }
        }
        StorageConfig::Cookie { cookie_name, .. } => {
            if let Some(name) = cookie_name {
                println!("  cookie: {}", name);
            }
            let key_status = match loaded.config.storage().cookie_key() {
                Ok(Some(_)) => "(key ✓)",
                Ok(None) => "(no key, unencrypted)",
                Err(_) => "(invalid key)",
            };
            println!("  encryption: {}", key_status);
        }
        StorageConfig::Memory => {}
    }
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

async fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} [{}] {}", status, source.layer, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'brace-session config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

const TEMPLATE: &str = r#"# Brace Session Configuration

# [server]
# port = 8080
# bind = "127.0.0.1"
# request_logging = true

[session]
cookie_name = "SESSID"
cookie_path = "/"
# Idle lifetime: a session not used for this long is discarded.
ttl_secs = 3600
# Absolute lifetime, counted from creation.
expires_secs = 86400
secure = false
same_site = "lax"

[storage]
backend = "file"
# dir = "/var/lib/brace-session"

# Keep sessions in an encrypted client cookie instead.
# Generate a key with 'brace-session keygen' and export it as BRACE_SESSION_KEY.
# [storage]
# backend = "cookie"
# cookie_name = "X-SESS-D"
"#;

async fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("brace-session.toml")
    } else {
        let dir = brace_config::xdg_config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, TEMPLATE)?;
    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  brace-session config show     # verify configuration");
    println!("  brace-session serve           # start the server");

    Ok(())
}

async fn cmd_path() -> Result<()> {
    if let Some(path) = brace_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
