//! Session lifecycle: creation, rounds, player mode, completion and cascading deletion.

use tracing::{debug, info};

use crate::{
    dao::{
        models::{
            HostEntity, PlayerEntity, PlayerMode, SessionEntity, Stamp, TapEntity, TeamEntity,
        },
        repository::{Indexed, Repository},
    },
    dto::{
        player::{PlayerExistsResponse, PlayerLookupResponse, PlayerSummary},
        session::{AdvanceRoundRequest, CreateSessionRequest, SessionSummary},
        sheets::DeleteResponse,
    },
    error::ServiceError,
    services::input::{generate_session_code, lookup_code, session_code},
    state::SharedState,
};

const MAX_CODE_ATTEMPTS: usize = 16;

/// Load a session row or fail with `NotFound`.
pub(crate) async fn load_session(
    repository: &Repository,
    session_id: &str,
) -> Result<Indexed<SessionEntity>, ServiceError> {
    repository
        .find::<SessionEntity, _>(|session| session.session_id == session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))
}

/// Delete every row belonging to a session: taps, players, teams, then the session itself.
pub(crate) async fn purge_session(
    repository: &Repository,
    session_id: &str,
) -> Result<usize, ServiceError> {
    let taps = repository
        .delete_where::<TapEntity, _>(|tap| tap.session_id == session_id)
        .await?;
    let players = repository
        .delete_where::<PlayerEntity, _>(|player| player.session_id == session_id)
        .await?;
    let teams = repository
        .delete_where::<TeamEntity, _>(|team| team.session_id == session_id)
        .await?;
    let sessions = repository
        .delete_where::<SessionEntity, _>(|session| session.session_id == session_id)
        .await?;

    debug!(%session_id, taps, players, teams, "session rows purged");
    Ok(taps + players + teams + sessions)
}

/// Open a session for a host. Creating a session that already exists for the same
/// host only updates its player mode.
pub async fn create_session(
    state: &SharedState,
    payload: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let code_length = state.config().session_code_length;
    let requested = payload
        .session_id
        .as_deref()
        .map(|code| session_code(code, code_length))
        .transpose()?;
    let host_username = payload.host_username.trim().to_string();
    let player_mode = payload.player_mode;

    state
        .run_write(move |repository| async move {
            if repository
                .find::<HostEntity, _>(|host| host.username == host_username)
                .await?
                .is_none()
            {
                return Err(ServiceError::NotFound(format!(
                    "host `{host_username}` not found"
                )));
            }

            let sessions = repository.list::<SessionEntity>().await?;
            let session_id = match requested {
                Some(code) => {
                    if let Some(existing) = sessions.iter().find(|s| s.entity.session_id == code) {
                        if existing.entity.host_username != host_username {
                            return Err(ServiceError::Conflict(format!(
                                "session code `{code}` is already in use"
                            )));
                        }
                        repository
                            .set_cell::<SessionEntity>(
                                existing.row,
                                "playerMode",
                                player_mode.as_str().to_string(),
                            )
                            .await?;
                        let mut updated = existing.entity.clone();
                        updated.player_mode = player_mode;
                        debug!(session_id = %code, mode = player_mode.as_str(), "session re-created; mode updated");
                        return Ok(updated.into());
                    }
                    code
                }
                None => unused_code(&sessions, code_length)?,
            };

            let session = SessionEntity {
                session_id,
                host_username,
                player_mode,
                round: 1,
                created_at: Stamp::now().rfc3339,
                active: true,
            };
            repository.insert(&session).await?;
            info!(
                session_id = %session.session_id,
                host = %session.host_username,
                mode = session.player_mode.as_str(),
                "session created"
            );
            Ok(session.into())
        })
        .await
}

fn unused_code(
    sessions: &[Indexed<SessionEntity>],
    length: usize,
) -> Result<String, ServiceError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_session_code(length);
        if !sessions.iter().any(|s| s.entity.session_id == code) {
            return Ok(code);
        }
    }
    Err(ServiceError::Conflict(
        "could not allocate a free session code".into(),
    ))
}

pub async fn list_host_sessions(
    state: &SharedState,
    host_username: &str,
) -> Result<Vec<SessionSummary>, ServiceError> {
    let host_username = host_username.trim();
    let repository = state.repository().await?;
    Ok(repository
        .list_where::<SessionEntity, _>(|session| session.host_username == host_username)
        .await?
        .into_iter()
        .map(SessionSummary::from)
        .collect())
}

pub async fn get_session(
    state: &SharedState,
    session_id: &str,
) -> Result<SessionSummary, ServiceError> {
    let repository = state.repository().await?;
    let session = load_session(&repository, &lookup_code(session_id)).await?;
    Ok(session.entity.into())
}

/// Move a session to a later round. Rounds never go backwards and completed
/// sessions keep their final round.
pub async fn advance_round(
    state: &SharedState,
    session_id: &str,
    payload: AdvanceRoundRequest,
) -> Result<SessionSummary, ServiceError> {
    let session_id = lookup_code(session_id);
    state
        .run_write(move |repository| async move {
            let Indexed { row, entity } = load_session(&repository, &session_id).await?;
            if !entity.active {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` is completed"
                )));
            }

            let next = match payload.round {
                Some(round) => round,
                None => entity.round.checked_add(1).ok_or_else(|| {
                    ServiceError::InvalidState(format!(
                        "session `{session_id}` has reached the last round"
                    ))
                })?,
            };
            if next <= entity.round {
                return Err(ServiceError::InvalidState(format!(
                    "round must increase (current {}, requested {next})",
                    entity.round
                )));
            }

            repository
                .set_cell::<SessionEntity>(row, "round", next.to_string())
                .await?;
            info!(%session_id, from = entity.round, to = next, "round advanced");
            Ok(SessionEntity {
                round: next,
                ..entity
            }
            .into())
        })
        .await
}

pub async fn update_mode(
    state: &SharedState,
    session_id: &str,
    player_mode: PlayerMode,
) -> Result<SessionSummary, ServiceError> {
    let session_id = lookup_code(session_id);
    state
        .run_write(move |repository| async move {
            let Indexed { row, entity } = load_session(&repository, &session_id).await?;
            repository
                .set_cell::<SessionEntity>(row, "playerMode", player_mode.as_str().to_string())
                .await?;
            debug!(%session_id, mode = player_mode.as_str(), "player mode updated");
            Ok(SessionEntity {
                player_mode,
                ..entity
            }
            .into())
        })
        .await
}

/// Mark a session completed; pollers stop once they observe it.
pub async fn complete_session(
    state: &SharedState,
    session_id: &str,
) -> Result<SessionSummary, ServiceError> {
    let session_id = lookup_code(session_id);
    state
        .run_write(move |repository| async move {
            let Indexed { row, entity } = load_session(&repository, &session_id).await?;
            if entity.active {
                repository
                    .set_cell::<SessionEntity>(row, "active", false.to_string())
                    .await?;
                info!(%session_id, round = entity.round, "session completed");
            }
            Ok(SessionEntity {
                active: false,
                ..entity
            }
            .into())
        })
        .await
}

pub async fn delete_session(
    state: &SharedState,
    session_id: &str,
) -> Result<DeleteResponse, ServiceError> {
    let session_id = lookup_code(session_id);
    state
        .run_write(move |repository| async move {
            load_session(&repository, &session_id).await?;
            let deleted = purge_session(&repository, &session_id).await?;
            info!(%session_id, deleted, "session deleted");
            Ok(DeleteResponse::new(deleted))
        })
        .await
}

pub async fn player_exists(
    state: &SharedState,
    session_id: &str,
    player_name: &str,
) -> Result<PlayerExistsResponse, ServiceError> {
    let session_id = lookup_code(session_id);
    let player_name = player_name.trim();
    let repository = state.repository().await?;
    let exists = repository
        .find::<PlayerEntity, _>(|player| {
            player.session_id == session_id && player.player_name == player_name
        })
        .await?
        .is_some();
    Ok(PlayerExistsResponse {
        success: true,
        exists,
    })
}

/// Look a player up by name, resolving its team.
pub async fn find_player(
    state: &SharedState,
    session_id: &str,
    player_name: &str,
) -> Result<PlayerLookupResponse, ServiceError> {
    let session_id = lookup_code(session_id);
    let player_name = player_name.trim();
    let repository = state.repository().await?;
    let player = repository
        .find::<PlayerEntity, _>(|player| {
            player.session_id == session_id && player.player_name == player_name
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "player `{player_name}` not found in session `{session_id}`"
            ))
        })?;
    let teams = repository
        .list_where::<TeamEntity, _>(|team| team.session_id == session_id)
        .await?;
    Ok(PlayerLookupResponse {
        success: true,
        player: PlayerSummary::with_teams(player.entity, &teams),
    })
}
