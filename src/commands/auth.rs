use anyhow::Result;

use crate::config;
use crate::gcal;

pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let google = cfg.google()?;

    println!("Authenticating with Google Calendar...");

    let tokens = gcal::authenticate(google).await?;

    let mut stored = config::load_tokens()?;
    stored.google = Some(tokens);
    config::save_tokens(&stored)?;

    println!("\nTokens saved to {}", config::tokens_path()?.display());
    println!("\nNext: run `runcal init` to create the group's schedule calendar,");
    println!("or add an existing calendar_id to the [calendar] section of config.toml.");

    Ok(())
}
