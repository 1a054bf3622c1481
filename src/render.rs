//! Terminal rendering of schedule rows and reconciliation results.

use owo_colors::OwoColorize;

use runcal_core::{ReconcileResult, ScheduledRun};

pub fn render_run(run: &ScheduledRun) -> String {
    let mut parts = vec![format!("{}  {}", run.date, run.start_time)];

    if run.is_cancelled {
        parts.push("CANCELLED".red().to_string());
    } else {
        let routes: Vec<String> = run.routes().iter().map(|r| r.name.clone()).collect();
        if !routes.is_empty() {
            parts.push(routes.join(" / "));
        }
        parts.push(format!("@ {}", run.meeting_point));
        if run.is_on_tour {
            parts.push("(on tour)".yellow().to_string());
        }
    }

    parts.join("  ")
}

pub fn render_result(result: &ReconcileResult, dry_run: bool) -> String {
    let mut lines = Vec::new();

    if dry_run {
        lines.push("Dry run, no changes made:".bold().to_string());
    }

    if result.changes() == 0 && result.skipped == 0 {
        lines.push("Nothing to do.".to_string());
    } else {
        if result.created > 0 {
            lines.push(format!("  {} {} created", "+".green(), result.created));
        }
        if result.updated > 0 {
            lines.push(format!("  {} {} updated", "~".yellow(), result.updated));
        }
        if result.deleted > 0 {
            lines.push(format!("  {} {} deleted", "-".red(), result.deleted));
        }
        if result.skipped > 0 {
            lines.push(format!("    {} skipped", result.skipped));
        }
    }

    if !result.errors.is_empty() {
        lines.push(format!("{}", "Errors:".red().bold()));
        for error in &result.errors {
            lines.push(format!("  {}", error.red()));
        }
    }

    lines.join("\n")
}
