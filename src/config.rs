//! Application configuration and token storage.
//!
//! Config lives at `~/.config/runcal/config.toml`, OAuth tokens next to it
//! in `tokens.json`. The file is split into sections mirroring what each
//! part of the app consumes; `to_sync_config` flattens the relevant parts
//! into the explicit value the reconciliation engine takes.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use runcal_core::schedule::ColumnOverrides;
use runcal_core::{NoRunDates, SyncConfig};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub group: GroupConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Google OAuth application credentials
    pub google: Option<GoogleConfig>,

    #[serde(default)]
    pub no_run_dates: NoRunDatesConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_group_name")]
    pub name: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_start_time")]
    pub default_start_time: String,

    #[serde(default = "default_meeting_point")]
    pub default_meeting_point: String,
}

#[derive(Debug, Deserialize)]
pub struct CalendarConfig {
    /// Target calendar, filled in by `runcal init`
    pub calendar_id: Option<String>,

    /// Event title, e.g. "Townsville Runners Schedule"
    #[serde(default)]
    pub calendar_name: String,

    #[serde(default = "default_duration")]
    pub event_duration_minutes: i64,

    #[serde(default = "default_marker")]
    pub description_marker: String,
}

/// OAuth credentials for Google Calendar
#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoRunDatesConfig {
    /// Fixed annual dates as [month, day] pairs
    pub annual: Option<Vec<(u32, u32)>>,

    /// One-off dates, ISO format
    #[serde(default)]
    pub specific: Vec<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleConfig {
    /// Column header overrides, keyed by field name
    #[serde(default)]
    pub columns: ColumnOverrides,
}

fn default_group_name() -> String {
    "My Running Group".to_string()
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

fn default_start_time() -> String {
    "19:00".to_string()
}

fn default_meeting_point() -> String {
    "Town Centre".to_string()
}

fn default_duration() -> i64 {
    60
}

fn default_marker() -> String {
    "Managed by runcal".to_string()
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            name: default_group_name(),
            timezone: default_timezone(),
            default_start_time: default_start_time(),
            default_meeting_point: default_meeting_point(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            calendar_id: None,
            calendar_name: String::new(),
            event_duration_minutes: default_duration(),
            description_marker: default_marker(),
        }
    }
}

impl Config {
    /// Flatten into the explicit config value the engine takes.
    pub fn to_sync_config(&self) -> Result<SyncConfig> {
        let timezone = self
            .group
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {e}", self.group.timezone))?;

        let mut no_run_dates = NoRunDates::default();
        if let Some(annual) = &self.no_run_dates.annual {
            no_run_dates.annual_holidays = annual.clone();
        }
        no_run_dates.specific_dates = self.no_run_dates.specific.clone();

        Ok(SyncConfig {
            group_name: self.group.name.clone(),
            calendar_name: self.calendar.calendar_name.clone(),
            timezone,
            default_start_time: self.group.default_start_time.clone(),
            default_meeting_point: self.group.default_meeting_point.clone(),
            event_duration_minutes: self.calendar.event_duration_minutes,
            description_marker: self.calendar.description_marker.clone(),
            no_run_dates,
        })
    }

    pub fn google(&self) -> Result<&GoogleConfig> {
        self.google.as_ref().context(
            "No [google] section in config.\n\n\
            Add your OAuth credentials to config.toml:\n\n\
            [google]\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"",
        )
    }

    pub fn calendar_id(&self) -> Result<&str> {
        self.calendar.calendar_id.as_deref().context(
            "No calendar_id in config. Run `runcal init` to create the group calendar,\n\
            then add the printed calendar_id to the [calendar] section of config.toml.",
        )
    }
}

/// Tokens for the authenticated Google account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub google: Option<AccountTokens>,
}

/// Get the config directory path (~/.config/runcal)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("runcal");
    Ok(config_dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

/// Load config from ~/.config/runcal/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with at least your Google OAuth credentials:\n\n\
            [group]\n\
            name = \"Townsville Runners\"\n\n\
            [google]\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Load tokens from ~/.config/runcal/tokens.json
pub fn load_tokens() -> Result<Tokens> {
    let path = tokens_path()?;

    if !path.exists() {
        return Ok(Tokens::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read tokens file at {}", path.display()))?;

    let tokens: Tokens = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens file at {}", path.display()))?;

    Ok(tokens)
}

/// Save tokens to ~/.config/runcal/tokens.json
pub fn save_tokens(tokens: &Tokens) -> Result<()> {
    let path = tokens_path()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory at {}", parent.display())
        })?;
    }

    let contents = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write tokens file at {}", path.display()))?;

    Ok(())
}
