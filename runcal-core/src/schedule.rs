//! Schedule types and tabular-record ingestion.
//!
//! The schedule arrives as rows of header → cell maps (the CLI reads them
//! from a CSV export of the group's sheet). Column names vary between
//! groups, so each field is resolved through an ordered candidate list:
//! the configured name first, then known fallbacks, first hit wins.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::error::ScheduleError;

/// A single route option for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub url: String,
    pub distance_km: Option<f64>,
    pub elevation_m: Option<f64>,
}

/// A single scheduled run. At most one per date in a reconciliation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledRun {
    pub date: NaiveDate,
    pub route_1: Option<Route>,
    pub route_2: Option<Route>,
    /// Walk / alternative option.
    pub route_3: Option<Route>,
    pub meeting_point: String,
    /// Local clock time, "HH:MM".
    pub start_time: String,
    pub notes: String,
    pub is_cancelled: bool,
    /// Meeting point differs from the group's usual location. Derived flag,
    /// not authoritative for reconciliation.
    pub is_on_tour: bool,
}

impl ScheduledRun {
    pub fn routes(&self) -> Vec<&Route> {
        [&self.route_1, &self.route_2, &self.route_3]
            .into_iter()
            .filter_map(|r| r.as_ref())
            .collect()
    }

    pub fn has_routes(&self) -> bool {
        !self.routes().is_empty()
    }
}

/// One row of the schedule source, header → cell.
pub type Record = BTreeMap<String, String>;

/// Per-group overrides for schedule column headers, keyed by field name
/// (e.g. "route_1_name" → "Route 1 - Name").
pub type ColumnOverrides = HashMap<String, String>;

const DATE_FALLBACKS: &[&str] = &["Date", "Date (Thu)", "Run Date"];
const ROUTE_1_NAME: &[&str] = &["Route 1 - Name", "Route 1 Name", "Route1"];
const ROUTE_1_URL: &[&str] = &["Route 1 URL", "Route 1 - URL", "Route1 URL"];
const ROUTE_1_DISTANCE: &[&str] = &["Route 1 Distance", "Route 1 - Distance (km)", "Route 1 - Distance"];
const ROUTE_2_NAME: &[&str] = &["Route 2 - Name", "Route 2 Name", "Route2"];
const ROUTE_2_URL: &[&str] = &["Route 2 URL", "Route 2 - URL", "Route2 URL"];
const ROUTE_2_DISTANCE: &[&str] = &["Route 2 Distance", "Route 2 - Distance (km)", "Route 2 - Distance"];
const ROUTE_3_NAME: &[&str] = &["Route 3 name", "Route 3 - Name", "Route 3 Name"];
const ROUTE_3_URL: &[&str] = &["Route 3 URL", "Route 3 - URL"];
const ROUTE_3_DESCRIPTION: &[&str] = &["Route 3 description", "Route 3 - Description"];
const MEETING_POINT: &[&str] = &["Meeting Point", "Meeting"];
const NOTES: &[&str] = &["Notes"];

const CANCEL_KEYWORDS: &[&str] = &["no run", "norun", "cancel", "skip"];

/// Date formats accepted in the schedule source, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%d %b %Y", "%d %B %Y"];

/// Clean a cell value, stripping spreadsheet NaN/None artifacts.
fn clean_value(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed.to_lowercase().as_str() {
        "nan" | "nat" | "none" => String::new(),
        _ => trimmed.to_string(),
    }
}

fn try_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Ensure a route URL uses https.
fn make_https(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Resolve a field against a record: configured override first, then the
/// fallback candidates in order.
fn resolve(record: &Record, overrides: &ColumnOverrides, key: &str, fallbacks: &[&str]) -> String {
    if let Some(configured) = overrides.get(key) {
        if let Some(value) = record.get(configured) {
            return clean_value(value);
        }
    }
    for candidate in fallbacks {
        if let Some(value) = record.get(*candidate) {
            return clean_value(value);
        }
    }
    String::new()
}

fn notes_mark_cancelled(notes: &str) -> bool {
    let lowered = notes.to_lowercase();
    CANCEL_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

fn build_route(name: String, url: String, distance: String) -> Option<Route> {
    if name.is_empty() {
        return None;
    }
    Some(Route {
        name,
        url: make_https(&url),
        distance_km: try_float(&distance),
        elevation_m: None,
    })
}

/// Find the date cell for a record: configured column, known fallbacks,
/// then any header containing "date".
fn resolve_date(record: &Record, overrides: &ColumnOverrides) -> Option<NaiveDate> {
    let raw = resolve(record, overrides, "date", DATE_FALLBACKS);
    if !raw.is_empty() {
        return parse_date(&raw);
    }
    record
        .iter()
        .find(|(header, _)| header.to_lowercase().contains("date"))
        .and_then(|(_, value)| parse_date(&clean_value(value)))
}

fn has_date_header(record: &Record, overrides: &ColumnOverrides) -> bool {
    if let Some(configured) = overrides.get("date") {
        if record.contains_key(configured) {
            return true;
        }
    }
    DATE_FALLBACKS.iter().any(|c| record.contains_key(*c))
        || record.keys().any(|h| h.to_lowercase().contains("date"))
}

/// Parse schedule records into [`ScheduledRun`]s, in source order.
///
/// Rows without a parsable date are skipped. Duplicate dates would make
/// reconciliation undefined, so the first row for a date wins and later
/// ones are dropped with a warning.
pub fn parse_records(
    records: &[Record],
    overrides: &ColumnOverrides,
    config: &SyncConfig,
) -> Result<Vec<ScheduledRun>, ScheduleError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let date_column_known = records.iter().any(|r| has_date_header(r, overrides));
    if !date_column_known {
        let configured = overrides
            .get("date")
            .cloned()
            .unwrap_or_else(|| DATE_FALLBACKS[0].to_string());
        return Err(ScheduleError::MissingDateColumn(configured));
    }

    let mut runs = Vec::new();
    let mut seen_dates: HashSet<NaiveDate> = HashSet::new();

    for record in records {
        let date = match resolve_date(record, overrides) {
            Some(date) => date,
            None => continue,
        };

        if !seen_dates.insert(date) {
            log::warn!("duplicate schedule row for {date}, keeping the first");
            continue;
        }

        let notes = resolve(record, overrides, "notes", NOTES);
        let is_cancelled =
            notes_mark_cancelled(&notes) || config.no_run_dates.is_no_run(date);

        let route_1 = build_route(
            resolve(record, overrides, "route_1_name", ROUTE_1_NAME),
            resolve(record, overrides, "route_1_url", ROUTE_1_URL),
            resolve(record, overrides, "route_1_distance", ROUTE_1_DISTANCE),
        );
        let route_2 = build_route(
            resolve(record, overrides, "route_2_name", ROUTE_2_NAME),
            resolve(record, overrides, "route_2_url", ROUTE_2_URL),
            resolve(record, overrides, "route_2_distance", ROUTE_2_DISTANCE),
        );

        // Route 3 may be described instead of named
        let r3_name = resolve(record, overrides, "route_3_name", ROUTE_3_NAME);
        let r3_desc = resolve(record, overrides, "route_3_description", ROUTE_3_DESCRIPTION);
        let route_3 = build_route(
            if r3_name.is_empty() { r3_desc } else { r3_name },
            resolve(record, overrides, "route_3_url", ROUTE_3_URL),
            String::new(),
        );

        let mut meeting_point = resolve(record, overrides, "meeting_point", MEETING_POINT);
        if meeting_point.is_empty() {
            meeting_point = meeting_point_from_notes(&notes)
                .unwrap_or_else(|| config.default_meeting_point.clone());
        }

        let is_on_tour = derive_on_tour(&meeting_point, &config.default_meeting_point, &notes);

        runs.push(ScheduledRun {
            date,
            route_1,
            route_2,
            route_3,
            meeting_point,
            start_time: config.default_start_time.clone(),
            notes,
            is_cancelled,
            is_on_tour,
        });
    }

    Ok(runs)
}

/// Pull a meeting point out of a "Meeting: ..." line in the notes.
fn meeting_point_from_notes(notes: &str) -> Option<String> {
    for line in notes.lines() {
        let lowered = line.to_lowercase();
        if let Some(pos) = lowered.find("meeting:") {
            let value = line[pos + "meeting:".len()..]
                .split(['|', '\n'])
                .next()
                .unwrap_or("")
                .trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn derive_on_tour(meeting_point: &str, default_location: &str, notes: &str) -> bool {
    let default_location = default_location.trim().to_lowercase();
    let current = meeting_point.trim().to_lowercase();

    !default_location.is_empty()
        && !current.is_empty()
        && current != default_location
        && !notes.to_lowercase().contains("tour")
}

/// Filter to runs on or after `today`, sorted by date.
pub fn upcoming(
    runs: &[ScheduledRun],
    today: NaiveDate,
    include_cancelled: bool,
) -> Vec<ScheduledRun> {
    let mut upcoming: Vec<ScheduledRun> = runs
        .iter()
        .filter(|r| r.date >= today)
        .filter(|r| include_cancelled || !r.is_cancelled)
        .cloned()
        .collect();
    upcoming.sort_by_key(|r| r.date);
    upcoming
}
