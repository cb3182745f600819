/// OpenAPI documentation generation.
pub mod documentation;
/// CSV exports of sessions, leaderboards and host statistics.
pub mod export_service;
/// Health check service.
pub mod health_service;
/// Host accounts and authentication.
pub mod host_service;
/// Name and join-code normalisation.
pub mod input;
/// Player joins and removal.
pub mod player_service;
/// Session lifecycle and rounds.
pub mod session_service;
/// Raw spreadsheet maintenance.
pub mod sheets_service;
/// Dashboard statistics.
pub mod stats_service;
/// Spreadsheet connection supervision and degraded mode.
pub mod storage_supervisor;
/// Tap recording and ordering.
pub mod tap_service;
/// Team management.
pub mod team_service;

#[cfg(test)]
pub(crate) mod test_support;
