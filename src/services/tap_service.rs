//! Tap recording and per-round ordering.
//!
//! "First tap wins" is decided by the `timestamp` stamped on arrival; taps sharing
//! a timestamp keep their sheet (insertion) order.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PlayerEntity, Stamp, TapEntity, TeamEntity},
        repository::Repository,
    },
    dto::{
        sheets::DeleteResponse,
        tap::{TapRequest, TapResponse, TapSummary},
    },
    error::ServiceError,
    services::{input::lookup_code, session_service::load_session},
    state::SharedState,
};

/// Sort taps by arrival; the sort is stable so equal timestamps keep sheet order.
pub fn order_taps(mut taps: Vec<TapEntity>) -> Vec<TapEntity> {
    taps.sort_by_key(|tap| tap.timestamp);
    taps
}

/// Ordered taps of one round of a session.
pub(crate) async fn round_taps(
    repository: &Repository,
    session_id: &str,
    round: u32,
) -> Result<Vec<TapEntity>, ServiceError> {
    let taps = repository
        .list_where::<TapEntity, _>(|tap| tap.session_id == session_id && tap.round == round)
        .await?;
    Ok(order_taps(taps))
}

/// Record a tap for the session's current round. A player taps at most once per
/// round; a repeated tap returns the original one with `already_tapped` set.
pub async fn record_tap(state: &SharedState, payload: TapRequest) -> Result<TapResponse, ServiceError> {
    let session_id = lookup_code(&payload.session_id);
    let player_name = payload.player_name.trim().to_string();
    let requested_team = payload
        .team_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let round = payload.round;

    state
        .run_write(move |repository| async move {
            let session = load_session(&repository, &session_id).await?.entity;
            if !session.active {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` is completed"
                )));
            }
            if round != session.round {
                return Err(ServiceError::InvalidState(format!(
                    "round {round} is not the current round ({})",
                    session.round
                )));
            }

            let player = repository
                .find::<PlayerEntity, _>(|player| {
                    player.session_id == session_id && player.player_name == player_name
                })
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "player `{player_name}` not found in session `{session_id}`"
                    ))
                })?
                .entity;

            let mut taps = round_taps(&repository, &session_id, round).await?;
            if let Some(index) = taps.iter().position(|tap| tap.player_name == player_name) {
                debug!(%session_id, player = %player_name, round, "duplicate tap ignored");
                return Ok(TapResponse {
                    tap: taps.swap_remove(index).into(),
                    position: index + 1,
                    already_tapped: true,
                });
            }

            let team_name = match player.team_id.as_deref() {
                Some(team_id) => repository
                    .find::<TeamEntity, _>(|team| team.team_id == team_id)
                    .await?
                    .map(|team| team.entity.team_name)
                    .or(requested_team),
                None => requested_team,
            };

            let stamp = Stamp::now();
            let tap = TapEntity {
                tap_id: Uuid::new_v4().simple().to_string(),
                session_id,
                player_name,
                team_name,
                round,
                timestamp: stamp.millis,
                time: stamp.clock,
            };
            repository.insert(&tap).await?;

            // Clock skew aside, a new tap lands last; count the taps it does not beat.
            let position = taps.iter().filter(|t| t.timestamp <= tap.timestamp).count() + 1;
            info!(
                session_id = %tap.session_id,
                player = %tap.player_name,
                round,
                position,
                "tap recorded"
            );
            Ok(TapResponse {
                tap: tap.into(),
                position,
                already_tapped: false,
            })
        })
        .await
}

pub async fn tap_order(
    state: &SharedState,
    session_id: &str,
    round: u32,
) -> Result<Vec<TapSummary>, ServiceError> {
    let session_id = lookup_code(session_id);
    let repository = state.repository().await?;
    Ok(round_taps(&repository, &session_id, round)
        .await?
        .into_iter()
        .map(TapSummary::from)
        .collect())
}

/// Clear every tap of a session, all rounds included.
pub async fn clear_taps(state: &SharedState, session_id: &str) -> Result<DeleteResponse, ServiceError> {
    let session_id = lookup_code(session_id);
    state
        .run_write(move |repository| async move {
            let deleted = repository
                .delete_where::<TapEntity, _>(|tap| tap.session_id == session_id)
                .await?;
            info!(%session_id, deleted, "taps cleared");
            Ok(DeleteResponse::new(deleted))
        })
        .await
}
