//! Date-keyed index of managed remote events.
//!
//! Private to one reconciliation pass. Entries are marked claimed as runs
//! match them; whatever is left unclaimed at the end of the pass is an
//! orphan. Events whose start timestamp is unusable are dropped at build
//! time so they can be neither claimed nor orphaned.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::event::RemoteEvent;

struct IndexEntry {
    event: RemoteEvent,
    claimed: bool,
}

/// Lookup from calendar date to the single managed event on that date.
#[derive(Default)]
pub struct EventIndex {
    entries: BTreeMap<NaiveDate, IndexEntry>,
}

impl EventIndex {
    /// Build the index from events already filtered to "managed".
    ///
    /// Dates are derived from the start timestamp in the group's timezone.
    /// Events without a usable start are silently dropped. If two events
    /// land on the same date, the later one encountered wins.
    pub fn build(events: Vec<RemoteEvent>, tz: Tz) -> Self {
        let mut entries = BTreeMap::new();

        for event in events {
            match event.start_date(tz) {
                Some(date) => {
                    if entries.contains_key(&date) {
                        log::warn!("multiple managed events on {date}, keeping the last one");
                    }
                    entries.insert(
                        date,
                        IndexEntry {
                            event,
                            claimed: false,
                        },
                    );
                }
                None => {
                    log::warn!(
                        "dropping managed event {} with unparsable start time",
                        event.id
                    );
                }
            }
        }

        EventIndex { entries }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RemoteEvent> {
        self.entries.get(&date).map(|entry| &entry.event)
    }

    /// Mark the event on this date as handled by the current pass so the
    /// orphan sweep skips it. Returns false if no event exists on the date.
    pub fn claim(&mut self, date: NaiveDate) -> bool {
        match self.entries.get_mut(&date) {
            Some(entry) => {
                entry.claimed = true;
                true
            }
            None => false,
        }
    }

    /// Events no run has claimed, in date order.
    pub fn orphans(&self) -> impl Iterator<Item = (NaiveDate, &RemoteEvent)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.claimed)
            .map(|(date, entry)| (*date, &entry.event))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
