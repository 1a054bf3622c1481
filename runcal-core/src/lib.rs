//! Core reconciliation engine for runcal.
//!
//! This crate is provider-neutral: it defines the schedule and event types,
//! the ownership filter, the desired-event builder and the reconciler, and
//! talks to the remote calendar only through the [`CalendarGateway`] trait.
//! The `runcal` binary supplies the Google Calendar implementation.

pub mod builder;
pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod index;
pub mod ownership;
pub mod reconcile;
pub mod schedule;

pub use builder::{build_description, build_event};
pub use config::{NoRunDates, SyncConfig};
pub use error::{GatewayError, ScheduleError};
pub use event::{DesiredEvent, EventStart, RemoteEvent};
pub use gateway::CalendarGateway;
pub use index::EventIndex;
pub use ownership::is_managed;
pub use reconcile::{reconcile, ReconcileResult};
pub use schedule::{Route, ScheduledRun};
