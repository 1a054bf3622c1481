//! Reconciliation configuration.
//!
//! An explicit value passed into the builder and reconciler at call time.
//! The CLI assembles it from `config.toml`; tests construct it directly.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Dates on which the group never runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoRunDates {
    /// Fixed annual dates as (month, day) pairs.
    pub annual_holidays: Vec<(u32, u32)>,
    /// Explicit one-off dates.
    pub specific_dates: Vec<NaiveDate>,
}

impl Default for NoRunDates {
    fn default() -> Self {
        NoRunDates {
            // Christmas Day, Boxing Day, New Year's Day
            annual_holidays: vec![(12, 25), (12, 26), (1, 1)],
            specific_dates: Vec::new(),
        }
    }
}

impl NoRunDates {
    pub fn is_no_run(&self, date: NaiveDate) -> bool {
        self.annual_holidays
            .contains(&(date.month(), date.day()))
            || self.specific_dates.contains(&date)
    }
}

/// Everything the builder and reconciler need to know about the group.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Group identity, used as the event title fallback.
    pub group_name: String,
    /// Calendar title, e.g. "Townsville Runners Schedule".
    pub calendar_name: String,
    /// IANA timezone the group runs in.
    pub timezone: Tz,
    /// Local clock time used when a run has no parsable start time.
    pub default_start_time: String,
    /// Meeting point used when the schedule gives none.
    pub default_meeting_point: String,
    /// Event length.
    pub event_duration_minutes: i64,
    /// Ownership marker embedded in every managed event description.
    pub description_marker: String,
    pub no_run_dates: NoRunDates,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            group_name: "My Running Group".to_string(),
            calendar_name: String::new(),
            timezone: chrono_tz::Europe::London,
            default_start_time: "19:00".to_string(),
            default_meeting_point: "Town Centre".to_string(),
            event_duration_minutes: 60,
            description_marker: "Managed by runcal".to_string(),
            no_run_dates: NoRunDates::default(),
        }
    }
}
