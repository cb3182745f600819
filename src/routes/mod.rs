use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod export;
pub mod health;
pub mod hosts;
pub mod players;
pub mod sessions;
pub mod sheets;
pub mod taps;
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(hosts::router())
        .merge(sessions::router())
        .merge(teams::router())
        .merge(players::router())
        .merge(taps::router())
        .merge(sheets::router())
        .merge(export::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
