//! The reconciler: one-directional schedule → calendar sync.
//!
//! For each scheduled run, decides create / update / delete / skip by
//! comparing the desired state against the indexed remote state, then sweeps
//! whatever the schedule did not claim as orphans. Every remote write is
//! individually fallible; a failed write is recorded and the pass continues.

use chrono::Duration;
use serde::Serialize;

use crate::builder::build_event;
use crate::config::SyncConfig;
use crate::gateway::CalendarGateway;
use crate::index::EventIndex;
use crate::ownership::is_managed;
use crate::schedule::ScheduledRun;

/// What one reconciliation pass did (or, in dry-run mode, would do).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReconcileResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    /// One entry per failed operation, in the order failures occurred.
    pub errors: Vec<String>,
}

impl ReconcileResult {
    pub fn changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Reconcile the remote calendar's event set with the schedule.
///
/// Never returns an error: failure to list existing events aborts the pass
/// with a single recorded error and zero operations, and individual write
/// failures are collected per item. In dry-run mode the counters are an
/// exact preview of a live run against the same remote state, and no write
/// is issued.
pub async fn reconcile(
    gateway: &dyn CalendarGateway,
    calendar_id: &str,
    runs: &[ScheduledRun],
    config: &SyncConfig,
    dry_run: bool,
) -> ReconcileResult {
    let mut result = ReconcileResult::default();

    if runs.is_empty() {
        return result;
    }

    // Window is the schedule's date span padded by a day on each side, so
    // timezone offsets at the edges cannot hide an event.
    // (unwrap safe: runs is non-empty here)
    let min_date = runs.iter().map(|r| r.date).min().unwrap() - Duration::days(1);
    let max_date = runs.iter().map(|r| r.date).max().unwrap() + Duration::days(1);

    let existing = match gateway.list_events(calendar_id, min_date, max_date).await {
        Ok(events) => events,
        Err(e) => {
            // Without the current index we cannot decide create-vs-update,
            // so the whole pass aborts before any write.
            result.errors.push(format!("Failed to list events: {e}"));
            return result;
        }
    };

    let managed: Vec<_> = existing
        .into_iter()
        .filter(|e| is_managed(e, &config.description_marker))
        .collect();
    log::debug!(
        "indexed {} managed events between {min_date} and {max_date}",
        managed.len()
    );

    let mut index = EventIndex::build(managed, config.timezone);

    for run in runs {
        let existing = index.get(run.date).cloned();

        // Cancellation (explicit or a configured no-run date) is terminal
        // for the date: delete whatever we own there, or skip.
        if run.is_cancelled || config.no_run_dates.is_no_run(run.date) {
            match existing {
                Some(event) => {
                    index.claim(run.date);
                    if dry_run {
                        result.deleted += 1;
                    } else {
                        match gateway.delete_event(calendar_id, &event.id).await {
                            Ok(()) => result.deleted += 1,
                            Err(e) => {
                                log::warn!("delete failed for {}: {e}", run.date);
                                result
                                    .errors
                                    .push(format!("Failed to delete event for {}: {e}", run.date));
                            }
                        }
                    }
                }
                None => result.skipped += 1,
            }
            continue;
        }

        let desired = build_event(run, config);

        match existing {
            Some(event) => {
                // No field-level diff: a matched date is rewritten every pass.
                index.claim(run.date);
                if dry_run {
                    result.updated += 1;
                } else {
                    match gateway.update_event(calendar_id, &event.id, &desired).await {
                        Ok(()) => result.updated += 1,
                        Err(e) => {
                            log::warn!("update failed for {}: {e}", run.date);
                            result
                                .errors
                                .push(format!("Failed to update event for {}: {e}", run.date));
                        }
                    }
                }
            }
            None => {
                if dry_run {
                    result.created += 1;
                } else {
                    match gateway.create_event(calendar_id, &desired).await {
                        Ok(id) => {
                            log::debug!("created event {id} for {}", run.date);
                            result.created += 1;
                        }
                        Err(e) => {
                            log::warn!("create failed for {}: {e}", run.date);
                            result
                                .errors
                                .push(format!("Failed to create event for {}: {e}", run.date));
                        }
                    }
                }
            }
        }
    }

    // Whatever the schedule did not claim is an orphan.
    let orphans: Vec<_> = index
        .orphans()
        .map(|(date, event)| (date, event.id.clone()))
        .collect();

    for (date, event_id) in orphans {
        if dry_run {
            result.deleted += 1;
        } else {
            match gateway.delete_event(calendar_id, &event_id).await {
                Ok(()) => result.deleted += 1,
                Err(e) => {
                    log::warn!("orphan delete failed for {date}: {e}");
                    result
                        .errors
                        .push(format!("Failed to delete orphan event for {date}: {e}"));
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::event::{DesiredEvent, EventStart, RemoteEvent};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex;

    const CAL: &str = "cal-1";

    /// Records every call; optionally fails listing, creating, or specific
    /// event ids.
    #[derive(Default)]
    struct MockGateway {
        events: Vec<RemoteEvent>,
        fail_list: bool,
        fail_create: bool,
        fail_ids: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn with_events(events: Vec<RemoteEvent>) -> Self {
            MockGateway {
                events,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn write_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| !c.starts_with("list"))
                .collect()
        }
    }

    #[async_trait]
    impl CalendarGateway for MockGateway {
        async fn list_events(
            &self,
            _calendar_id: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<RemoteEvent>, GatewayError> {
            self.calls.lock().unwrap().push(format!("list:{start}:{end}"));
            if self.fail_list {
                return Err(GatewayError::Request("boom".to_string()));
            }
            Ok(self.events.clone())
        }

        async fn create_event(
            &self,
            _calendar_id: &str,
            event: &DesiredEvent,
        ) -> Result<String, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create:{}", event.start.date()));
            if self.fail_create {
                return Err(GatewayError::Request("boom".to_string()));
            }
            Ok("new-id".to_string())
        }

        async fn update_event(
            &self,
            _calendar_id: &str,
            event_id: &str,
            _event: &DesiredEvent,
        ) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(format!("update:{event_id}"));
            if self.fail_ids.contains(event_id) {
                return Err(GatewayError::Request("boom".to_string()));
            }
            Ok(())
        }

        async fn delete_event(
            &self,
            _calendar_id: &str,
            event_id: &str,
        ) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(format!("delete:{event_id}"));
            if self.fail_ids.contains(event_id) {
                return Err(GatewayError::Request("boom".to_string()));
            }
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_on(y: i32, m: u32, d: u32) -> ScheduledRun {
        ScheduledRun {
            date: date(y, m, d),
            route_1: None,
            route_2: None,
            route_3: None,
            meeting_point: "Town Centre".to_string(),
            start_time: "19:00".to_string(),
            notes: String::new(),
            is_cancelled: false,
            is_on_tour: false,
        }
    }

    fn managed_event(id: &str, y: i32, m: u32, d: u32) -> RemoteEvent {
        RemoteEvent {
            id: id.to_string(),
            description: Some("Managed by runcal\nMeeting: Town Centre".to_string()),
            start: Some(EventStart::DateTime(
                Utc.with_ymd_and_hms(y, m, d, 18, 0, 0).unwrap(),
            )),
        }
    }

    fn foreign_event(id: &str, y: i32, m: u32, d: u32) -> RemoteEvent {
        RemoteEvent {
            id: id.to_string(),
            description: Some("Dentist".to_string()),
            start: Some(EventStart::DateTime(
                Utc.with_ymd_and_hms(y, m, d, 18, 0, 0).unwrap(),
            )),
        }
    }

    fn counts(result: &ReconcileResult) -> (usize, usize, usize, usize) {
        (result.created, result.updated, result.deleted, result.skipped)
    }

    #[tokio::test]
    async fn test_empty_schedule_makes_no_gateway_calls() {
        let gateway = MockGateway::default();
        let result = reconcile(&gateway, CAL, &[], &SyncConfig::default(), false).await;

        assert_eq!(result, ReconcileResult::default());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_run_creates_event() {
        let gateway = MockGateway::default();
        let runs = vec![run_on(2025, 6, 5)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (1, 0, 0, 0));
        assert!(result.is_clean());
        // Window is padded by one day each side
        assert_eq!(
            gateway.calls(),
            vec!["list:2025-06-04:2025-06-06", "create:2025-06-05"]
        );
    }

    #[tokio::test]
    async fn test_orphan_deleted_and_new_run_created() {
        let gateway = MockGateway::with_events(vec![managed_event("old", 2025, 6, 5)]);
        let runs = vec![run_on(2025, 6, 12)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (1, 0, 1, 0));
        assert_eq!(
            gateway.write_calls(),
            vec!["create:2025-06-12", "delete:old"]
        );
    }

    #[tokio::test]
    async fn test_cancelled_run_with_no_event_is_skipped() {
        let gateway = MockGateway::default();
        let mut run = run_on(2025, 6, 5);
        run.is_cancelled = true;
        let result = reconcile(&gateway, CAL, &[run], &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 0, 0, 1));
        assert!(gateway.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_deletes_exactly_once() {
        // Cancelled run with a pre-existing managed event: outcome is a
        // single delete, never an update, and never a second orphan delete.
        let gateway = MockGateway::with_events(vec![managed_event("e1", 2025, 6, 5)]);
        let mut run = run_on(2025, 6, 5);
        run.is_cancelled = true;
        let result = reconcile(&gateway, CAL, &[run], &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 0, 1, 0));
        assert_eq!(gateway.write_calls(), vec!["delete:e1"]);
    }

    #[tokio::test]
    async fn test_no_run_date_treated_as_cancelled() {
        let gateway = MockGateway::with_events(vec![managed_event("xmas", 2025, 12, 25)]);
        let runs = vec![run_on(2025, 12, 25)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 0, 1, 0));
        assert_eq!(gateway.write_calls(), vec!["delete:xmas"]);
    }

    #[tokio::test]
    async fn test_matched_date_updated_unconditionally() {
        let gateway = MockGateway::with_events(vec![managed_event("e1", 2025, 6, 5)]);
        let runs = vec![run_on(2025, 6, 5)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 1, 0, 0));
        assert_eq!(gateway.write_calls(), vec!["update:e1"]);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        // After a first pass, every active run has a managed event on its
        // date: the second pass only issues updates.
        let gateway = MockGateway::with_events(vec![
            managed_event("e1", 2025, 6, 5),
            managed_event("e2", 2025, 6, 12),
        ]);
        let runs = vec![run_on(2025, 6, 5), run_on(2025, 6, 12)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 2, 0, 0));
    }

    #[tokio::test]
    async fn test_foreign_event_is_never_touched() {
        let gateway = MockGateway::with_events(vec![foreign_event("theirs", 2025, 6, 5)]);
        let runs = vec![run_on(2025, 6, 5)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        // Co-existence: a managed event is created alongside the foreign one
        assert_eq!(counts(&result), (1, 0, 0, 0));
        assert_eq!(gateway.write_calls(), vec!["create:2025-06-05"]);
    }

    #[tokio::test]
    async fn test_list_failure_aborts_with_single_error() {
        let gateway = MockGateway {
            fail_list: true,
            ..Default::default()
        };
        let runs = vec![run_on(2025, 6, 5)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (0, 0, 0, 0));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to list events"));
        assert!(gateway.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_isolated_per_item() {
        // Update of the first date fails; the second date's create and the
        // orphan delete still happen, and the failed counter stays put.
        let mut gateway = MockGateway::with_events(vec![
            managed_event("bad", 2025, 6, 5),
            managed_event("orphan", 2025, 6, 10),
        ]);
        gateway.fail_ids.insert("bad".to_string());

        let runs = vec![run_on(2025, 6, 5), run_on(2025, 6, 12)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        assert_eq!(counts(&result), (1, 0, 1, 0));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("2025-06-05"));
        // The failed update still claims the date: no orphan delete for "bad"
        assert_eq!(
            gateway.write_calls(),
            vec!["update:bad", "create:2025-06-12", "delete:orphan"]
        );
    }

    #[tokio::test]
    async fn test_unparsable_start_is_left_untouched() {
        let broken = RemoteEvent {
            id: "broken".to_string(),
            description: Some("Managed by runcal".to_string()),
            start: None,
        };
        let gateway = MockGateway::with_events(vec![broken]);
        let runs = vec![run_on(2025, 6, 12)];
        let result = reconcile(&gateway, CAL, &runs, &SyncConfig::default(), false).await;

        // Not claimable, not an orphan: only the new run's create happens
        assert_eq!(counts(&result), (1, 0, 0, 0));
        assert_eq!(gateway.write_calls(), vec!["create:2025-06-12"]);
    }

    #[tokio::test]
    async fn test_dry_run_counts_match_live_run_and_issue_no_writes() {
        let events = vec![
            managed_event("update-me", 2025, 6, 5),
            managed_event("cancel-me", 2025, 6, 12),
            managed_event("orphan", 2025, 6, 17),
        ];
        let mut cancelled = run_on(2025, 6, 12);
        cancelled.is_cancelled = true;
        let runs = vec![
            run_on(2025, 6, 5),
            cancelled,
            run_on(2025, 6, 19),
            {
                let mut r = run_on(2025, 6, 26);
                r.is_cancelled = true;
                r
            },
        ];
        let config = SyncConfig::default();

        let dry_gateway = MockGateway::with_events(events.clone());
        let dry = reconcile(&dry_gateway, CAL, &runs, &config, true).await;

        let live_gateway = MockGateway::with_events(events);
        let live = reconcile(&live_gateway, CAL, &runs, &config, false).await;

        assert_eq!(counts(&dry), counts(&live));
        assert_eq!(counts(&dry), (1, 1, 2, 1));
        assert!(dry_gateway.write_calls().is_empty());
        assert!(!live_gateway.write_calls().is_empty());
    }
}
