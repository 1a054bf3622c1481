use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use runcal_core::schedule::{parse_records, upcoming};

use crate::config;
use crate::render;
use crate::schedule;

/// Show the parsed upcoming schedule without touching the calendar.
pub fn run(file: &Path, all: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let sync_config = cfg.to_sync_config()?;

    let records = schedule::load_csv(file)?;
    let runs = parse_records(&records, &cfg.schedule.columns, &sync_config)?;

    let today = Utc::now().with_timezone(&sync_config.timezone).date_naive();
    let upcoming = upcoming(&runs, today, all);

    if upcoming.is_empty() {
        println!("No upcoming runs in the schedule.");
        return Ok(());
    }

    for run in &upcoming {
        println!("{}", render::render_run(run));
    }

    Ok(())
}
