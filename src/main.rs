mod commands;
mod config;
mod gcal;
mod render;
mod schedule;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "runcal")]
#[command(about = "Keep your running group's Google Calendar in sync with the weekly run schedule")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google Calendar
    Auth,
    /// Create the group's public schedule calendar
    Init {
        /// Calendar name (defaults to "<group name> Schedule")
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the parsed upcoming schedule
    Schedule {
        /// Path to the schedule CSV export
        file: PathBuf,

        /// Include cancelled runs
        #[arg(long)]
        all: bool,
    },
    /// Preview what sync would change, without touching the calendar
    Status {
        /// Path to the schedule CSV export
        #[arg(short, long)]
        schedule: PathBuf,
    },
    /// Sync the schedule to the group calendar
    Sync {
        /// Path to the schedule CSV export
        #[arg(short, long)]
        schedule: PathBuf,

        /// Report what would change without issuing any write
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Init { name } => commands::init::run(name).await,
        Commands::Schedule { file, all } => commands::schedule::run(&file, all),
        Commands::Status { schedule } => commands::sync::run(&schedule, true).await,
        Commands::Sync { schedule, dry_run } => commands::sync::run(&schedule, dry_run).await,
    }
}
