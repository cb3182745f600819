//! Polling client for the REST API.
//!
//! There is no push channel: host and player views poll the backend on an
//! interval, diff each fetched value against the cached one and only report a
//! change when the reconciled view actually moved.

/// HTTP access to the backend behind the [`api::GameApi`] seam.
pub mod api;
/// JSON-equality change detection.
pub mod diff;
/// Failures of the polling client.
pub mod error;
/// Host dashboard reconciliation.
pub mod host;
/// Player buzzer reconciliation and optimistic taps.
pub mod player;
/// Interval loops publishing reconciled views.
pub mod poller;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Session is running; views were refreshed.
    Active,
    /// The session code is unknown to the backend.
    NotFound,
    /// The session was completed; polling should stop.
    Completed,
}

#[cfg(test)]
pub(crate) mod fake;
