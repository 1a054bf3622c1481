//! Remote calendar gateway boundary.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::GatewayError;
use crate::event::{DesiredEvent, RemoteEvent};

/// Thin interface over the remote calendar service.
///
/// Each operation is a single stateless round trip. No retries happen here:
/// a failure surfaces immediately to the reconciler, which records it and
/// continues. Implementations must bound each call with a deadline so one
/// stalled request cannot hang a whole pass.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// List events with a start inside the inclusive date window.
    async fn list_events(
        &self,
        calendar_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RemoteEvent>, GatewayError>;

    /// Create an event, returning its remote id.
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &DesiredEvent,
    ) -> Result<String, GatewayError>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &DesiredEvent,
    ) -> Result<(), GatewayError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError>;
}
