//! Fixtures shared by the service tests.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::{
        models::{HostEntity, PlayerMode, SessionEntity},
        repository::Repository,
        sheet_store::memory::MemorySheetStore,
    },
    state::{AppState, SharedState},
};

/// State backed by a fresh in-memory spreadsheet, plus a repository over the same data.
pub async fn ready_state() -> (SharedState, Repository) {
    let store = Arc::new(MemorySheetStore::new().await);
    let state = AppState::new(AppConfig::default());
    state.set_sheet_store(store.clone()).await;
    (state, Repository::new(store))
}

pub async fn seed_host(state: &SharedState, username: &str) {
    let repository = state.repository().await.unwrap();
    repository
        .insert(&HostEntity {
            username: username.into(),
            password: String::new(),
            created_at: "2024-01-01T00:00:00Z".into(),
        })
        .await
        .unwrap();
}

/// Insert an active session at round 1 owned by host `host`.
pub async fn seed_session(state: &SharedState, session_id: &str, mode: PlayerMode) {
    let repository = state.repository().await.unwrap();
    repository
        .insert(&SessionEntity {
            session_id: session_id.into(),
            host_username: "host".into(),
            player_mode: mode,
            round: 1,
            created_at: "2024-01-01T00:00:00Z".into(),
            active: true,
        })
        .await
        .unwrap();
}
