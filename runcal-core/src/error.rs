//! Error types for the runcal ecosystem.

use thiserror::Error;

/// Errors surfaced by a remote calendar gateway.
///
/// The reconciler never propagates these: a failed list aborts the pass with
/// a single recorded error, and failed writes are collected per item.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote calendar request failed: {0}")]
    Request(String),

    #[error("Remote calendar request timed out after {0}s")]
    Timeout(u64),
}

/// Errors from schedule ingestion.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Date column '{0}' not found in schedule data")]
    MissingDateColumn(String),
}
