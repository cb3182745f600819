/// Database row models and sheet layout.
pub mod models;
/// Typed access to hosts, sessions, teams, players and taps.
pub mod repository;
/// Spreadsheet storage backends.
pub mod sheet_store;
/// Storage abstraction layer for database operations.
pub mod storage;
