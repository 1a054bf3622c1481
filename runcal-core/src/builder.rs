//! Desired-event builder.
//!
//! Maps one scheduled run into the canonical remote-event representation the
//! reconciler wants to exist. Deterministic and total: no network, no state.

use chrono::{Duration, NaiveTime};

use crate::config::SyncConfig;
use crate::event::DesiredEvent;
use crate::schedule::ScheduledRun;

/// Fallback when the run's start time is unparsable.
const DEFAULT_START: (u32, u32) = (19, 0);

fn parse_clock_time(value: &str) -> (u32, u32) {
    let mut parts = value.trim().splitn(2, ':');
    let hour = parts.next().and_then(|p| p.parse().ok());
    let minute = parts.next().and_then(|p| p.parse().ok());
    match (hour, minute) {
        (Some(h), Some(m)) if h < 24 && m < 60 => (h, m),
        _ => DEFAULT_START,
    }
}

/// Build the event description: the ownership marker, one line per defined
/// route, the meeting point, then free-text notes.
pub fn build_description(run: &ScheduledRun, config: &SyncConfig) -> String {
    let mut lines = vec![config.description_marker.clone()];

    if let Some(route) = &run.route_1 {
        lines.push(format!("8K Route: {}", route.name));
        if !route.url.is_empty() {
            lines.push(format!("8K Link: {}", route.url));
        }
    }

    if let Some(route) = &run.route_2 {
        lines.push(format!("5K Route: {}", route.name));
        if !route.url.is_empty() {
            lines.push(format!("5K Link: {}", route.url));
        }
    }

    if let Some(route) = &run.route_3 {
        let label = if route.name.is_empty() {
            "Walk"
        } else {
            route.name.as_str()
        };
        let distance = match route.distance_km {
            Some(km) => format!(" ({km} km)"),
            None => String::new(),
        };
        lines.push(format!("Social Walk Route: {label}{distance}"));
        if !route.url.is_empty() {
            lines.push(format!("Social Walk Link: {}", route.url));
        }
    }

    lines.push(format!("Meeting: {}", run.meeting_point));

    if !run.notes.is_empty() {
        lines.push(run.notes.clone());
    }

    lines.join("\n")
}

/// Build the [`DesiredEvent`] for a scheduled run.
pub fn build_event(run: &ScheduledRun, config: &SyncConfig) -> DesiredEvent {
    let (hour, minute) = parse_clock_time(&run.start_time);
    // Both components validated by parse_clock_time
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let start = run.date.and_time(time);
    let end = start + Duration::minutes(config.event_duration_minutes);

    let title = if config.calendar_name.is_empty() {
        config.group_name.clone()
    } else {
        config.calendar_name.clone()
    };

    DesiredEvent {
        title,
        description: build_description(run, config),
        location: run.meeting_point.clone(),
        start,
        end,
        timezone: config.timezone.name().to_string(),
    }
}
