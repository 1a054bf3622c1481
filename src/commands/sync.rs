use std::path::Path;

use anyhow::Result;

use runcal_core::reconcile;
use runcal_core::schedule::parse_records;

use crate::config;
use crate::gcal::{self, GoogleGateway};
use crate::render;
use crate::schedule;

/// Reconcile the schedule file against the group calendar. With `dry_run`,
/// report what would change without issuing any write.
pub async fn run(file: &Path, dry_run: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let sync_config = cfg.to_sync_config()?;
    let calendar_id = cfg.calendar_id()?;
    let google = cfg.google()?;

    let records = schedule::load_csv(file)?;
    let runs = parse_records(&records, &cfg.schedule.columns, &sync_config)?;
    println!("Loaded {} scheduled runs from {}", runs.len(), file.display());

    let tokens = gcal::valid_tokens(google).await?;
    let gateway = GoogleGateway::new(google, &tokens);

    let result = reconcile(&gateway, calendar_id, &runs, &sync_config, dry_run).await;

    println!("{}", render::render_result(&result, dry_run));

    if !result.is_clean() {
        anyhow::bail!("sync finished with {} error(s)", result.errors.len());
    }

    Ok(())
}
