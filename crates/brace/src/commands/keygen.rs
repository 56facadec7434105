//! Keygen command - prints a fresh cookie encryption key.

use anyhow::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use brace_config::SESSION_KEY_ENV;
use brace_session::Key;

use super::Context;

/// Run the keygen command.
pub async fn run(ctx: &Context) -> Result<()> {
    let encoded = STANDARD.encode(Key::generate().master());

    if ctx.json_output {
        println!("{}", serde_json::json!({ "key": encoded }));
    } else {
        println!("{}", encoded);
        if ctx.verbose {
            eprintln!("Export it as {} to encrypt cookie storage.", SESSION_KEY_ENV);
        }
    }

    Ok(())
}
