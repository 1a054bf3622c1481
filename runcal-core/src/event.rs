//! Provider-neutral event types.
//!
//! Gateways convert their API responses into [`RemoteEvent`] and accept
//! [`DesiredEvent`] for writes; the reconciler works exclusively with these.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// An event as it currently exists on the remote calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Opaque remote identifier.
    pub id: String,
    pub description: Option<String>,
    /// Start timestamp as reported by the provider. `None` when the provider
    /// returned something unusable; such events are left untouched.
    pub start: Option<EventStart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventStart {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl RemoteEvent {
    /// Calendar date of the event in the given timezone, if the start
    /// timestamp is usable.
    pub fn start_date(&self, tz: Tz) -> Option<NaiveDate> {
        match self.start {
            Some(EventStart::DateTime(dt)) => Some(dt.with_timezone(&tz).date_naive()),
            Some(EventStart::Date(d)) => Some(d),
            None => None,
        }
    }
}

/// The event the engine wants to exist for a scheduled run.
///
/// A deterministic projection of a [`crate::ScheduledRun`] plus config; the
/// description always begins with the ownership marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Local wall-clock start, interpreted in `timezone`.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// IANA timezone name, e.g. "Europe/London".
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_date_converts_to_local_timezone() {
        // 23:30 UTC on the 5th is already the 6th in Helsinki (UTC+3 in June)
        let event = RemoteEvent {
            id: "e1".to_string(),
            description: None,
            start: Some(EventStart::DateTime(
                Utc.with_ymd_and_hms(2025, 6, 5, 23, 30, 0).unwrap(),
            )),
        };
        assert_eq!(
            event.start_date(chrono_tz::Europe::Helsinki),
            NaiveDate::from_ymd_opt(2025, 6, 6)
        );
        assert_eq!(
            event.start_date(chrono_tz::Europe::London),
            NaiveDate::from_ymd_opt(2025, 6, 6)
        );
        assert_eq!(
            event.start_date(chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
    }

    #[test]
    fn test_start_date_missing_start_is_none() {
        let event = RemoteEvent {
            id: "e1".to_string(),
            description: None,
            start: None,
        };
        assert_eq!(event.start_date(chrono_tz::UTC), None);
    }
}
