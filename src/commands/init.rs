use anyhow::Result;

use crate::config;
use crate::gcal;

/// Create the group's public schedule calendar and print the details to put
/// in config.toml.
pub async fn run(name: Option<String>) -> Result<()> {
    let cfg = config::load_config()?;
    let google = cfg.google()?;
    let tokens = gcal::valid_tokens(google).await?;
    let client = gcal::create_client(google, &tokens);

    let calendar_name = name.unwrap_or_else(|| format!("{} Schedule", cfg.group.name));

    println!("Creating calendar \"{}\"...", calendar_name);
    let calendar_id = gcal::create_calendar(&client, &calendar_name, &cfg.group.timezone).await?;

    println!("\nCalendar created and made public.");
    println!("\nAdd it to your config.toml:");
    println!();
    println!("[calendar]");
    println!("calendar_id = \"{}\"", calendar_id);
    println!("calendar_name = \"{}\"", calendar_name);
    println!();
    println!("Share with runners:");
    println!("  Subscribe (iCal): {}", gcal::subscribe_url(&calendar_id));
    println!("  Web view:         {}", gcal::web_view_url(&calendar_id));

    Ok(())
}
