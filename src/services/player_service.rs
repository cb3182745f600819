use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{JoinMode, PlayerEntity, PlayerMode, Stamp, TapEntity, TeamEntity},
    dto::{
        player::{JoinPlayerRequest, JoinPlayerResponse, PlayerSummary},
        sheets::DeleteResponse,
    },
    error::ServiceError,
    services::{
        input::{clean_name, lookup_code},
        session_service::load_session,
    },
    state::SharedState,
};

/// Check a join request against the session's player mode.
fn check_join_mode(
    player_mode: PlayerMode,
    join_mode: JoinMode,
    team_id: Option<&str>,
) -> Result<(), ServiceError> {
    match (player_mode, join_mode.is_team()) {
        (PlayerMode::Single, true) => Err(ServiceError::InvalidState(
            "session only accepts single players".into(),
        )),
        (PlayerMode::Teams, false) => Err(ServiceError::InvalidState(
            "session only accepts team players".into(),
        )),
        (_, true) if team_id.is_none() => Err(ServiceError::InvalidInput(
            "a team is required for team joins".into(),
        )),
        (_, false) if team_id.is_some() => Err(ServiceError::InvalidInput(
            "single players cannot join a team".into(),
        )),
        _ => Ok(()),
    }
}

/// Add a player to a session. A name already present in the session rejoins as
/// that player instead of creating a duplicate.
pub async fn join_session(
    state: &SharedState,
    payload: JoinPlayerRequest,
) -> Result<JoinPlayerResponse, ServiceError> {
    let session_id = lookup_code(&payload.session_id);
    let player_name = clean_name(
        &payload.player_name,
        state.config().max_name_length,
        "player name",
    )?;
    let team_id = payload
        .team_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let join_mode = payload.join_mode;

    state
        .run_write(move |repository| async move {
            let session = load_session(&repository, &session_id).await?.entity;

            if let Some(existing) = repository
                .find::<PlayerEntity, _>(|player| {
                    player.session_id == session_id && player.player_name == player_name
                })
                .await?
            {
                debug!(%session_id, player = %player_name, "player rejoined");
                return Ok(JoinPlayerResponse {
                    player_id: existing.entity.player_id,
                    existing: true,
                });
            }

            if !session.active {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` is completed"
                )));
            }
            check_join_mode(session.player_mode, join_mode, team_id.as_deref())?;

            if let Some(team_id) = team_id.as_deref() {
                let known = repository
                    .find::<TeamEntity, _>(|team| {
                        team.team_id == team_id && team.session_id == session_id
                    })
                    .await?
                    .is_some();
                if !known {
                    return Err(ServiceError::NotFound(format!(
                        "team `{team_id}` not found in session `{session_id}`"
                    )));
                }
            }

            let player = PlayerEntity {
                player_id: Uuid::new_v4().simple().to_string(),
                session_id,
                team_id,
                player_name,
                join_mode,
                created_at: Stamp::now().rfc3339,
            };
            repository.insert(&player).await?;
            info!(
                session_id = %player.session_id,
                player = %player.player_name,
                join_mode = player.join_mode.as_str(),
                "player joined"
            );
            Ok(JoinPlayerResponse {
                player_id: player.player_id,
                existing: false,
            })
        })
        .await
}

pub async fn list_players(
    state: &SharedState,
    session_id: &str,
) -> Result<Vec<PlayerSummary>, ServiceError> {
    let session_id = lookup_code(session_id);
    let repository = state.repository().await?;
    let teams = repository
        .list_where::<TeamEntity, _>(|team| team.session_id == session_id)
        .await?;
    Ok(repository
        .list_where::<PlayerEntity, _>(|player| player.session_id == session_id)
        .await?
        .into_iter()
        .map(|player| PlayerSummary::with_teams(player, &teams))
        .collect())
}

/// Remove a player and the taps it recorded in its session.
pub async fn delete_player(
    state: &SharedState,
    player_id: &str,
) -> Result<DeleteResponse, ServiceError> {
    let player_id = player_id.trim().to_string();
    state
        .run_write(move |repository| async move {
            let player = repository
                .find::<PlayerEntity, _>(|player| player.player_id == player_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?
                .entity;

            let taps = repository
                .delete_where::<TapEntity, _>(|tap| {
                    tap.session_id == player.session_id && tap.player_name == player.player_name
                })
                .await?;
            let players = repository
                .delete_where::<PlayerEntity, _>(|candidate| candidate.player_id == player_id)
                .await?;
            info!(%player_id, session_id = %player.session_id, taps, "player removed");
            Ok(DeleteResponse::new(taps + players))
        })
        .await
}
