use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, PlayerMode, Stamp, TeamCreator, TeamEntity},
    dto::{
        host::ValidationResponse,
        sheets::DeleteResponse,
        team::{CreateTeamRequest, CreateTeamResponse, TeamSummary, ValidateTeamRequest},
    },
    error::ServiceError,
    services::{
        input::{clean_name, lookup_code},
        session_service::load_session,
    },
    state::SharedState,
};

/// Register a team in a session. Names are unique per session and single-player
/// sessions accept no teams.
pub async fn create_team(
    state: &SharedState,
    payload: CreateTeamRequest,
) -> Result<CreateTeamResponse, ServiceError> {
    let session_id = lookup_code(&payload.session_id);
    let team_name = clean_name(&payload.team_name, state.config().max_name_length, "team name")?;
    let password = payload.password.trim().to_string();
    let created_by = payload.created_by.unwrap_or(TeamCreator::Host);

    state
        .run_write(move |repository| async move {
            let session = load_session(&repository, &session_id).await?.entity;
            if !session.active {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` is completed"
                )));
            }
            if session.player_mode == PlayerMode::Single {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` only accepts single players"
                )));
            }

            let duplicate = repository
                .find::<TeamEntity, _>(|team| {
                    team.session_id == session_id && team.team_name == team_name
                })
                .await?
                .is_some();
            if duplicate {
                return Err(ServiceError::Conflict(format!(
                    "team `{team_name}` already exists in session `{session_id}`"
                )));
            }

            let team = TeamEntity {
                team_id: Uuid::new_v4().simple().to_string(),
                session_id,
                team_name,
                password,
                created_by,
                created_at: Stamp::now().rfc3339,
            };
            repository.insert(&team).await?;
            info!(
                session_id = %team.session_id,
                team = %team.team_name,
                created_by = team.created_by.as_str(),
                "team created"
            );
            Ok(CreateTeamResponse {
                team_id: team.team_id,
            })
        })
        .await
}

pub async fn validate_team(
    state: &SharedState,
    payload: ValidateTeamRequest,
) -> Result<ValidationResponse, ServiceError> {
    let session_id = lookup_code(&payload.session_id);
    let team_name = payload.team_name.trim();
    let password = payload.password.trim();
    let repository = state.repository().await?;
    let is_valid = repository
        .find::<TeamEntity, _>(|team| {
            team.session_id == session_id && team.team_name == team_name
        })
        .await?
        .is_some_and(|team| team.entity.password == password);
    Ok(ValidationResponse { is_valid })
}

pub async fn list_teams(
    state: &SharedState,
    session_id: &str,
) -> Result<Vec<TeamSummary>, ServiceError> {
    let session_id = lookup_code(session_id);
    let repository = state.repository().await?;
    Ok(repository
        .list_where::<TeamEntity, _>(|team| team.session_id == session_id)
        .await?
        .into_iter()
        .map(TeamSummary::from)
        .collect())
}

/// Delete a team together with its members. Their taps stay in the round history.
pub async fn delete_team(state: &SharedState, team_id: &str) -> Result<DeleteResponse, ServiceError> {
    let team_id = team_id.trim().to_string();
    state
        .run_write(move |repository| async move {
            if repository
                .find::<TeamEntity, _>(|team| team.team_id == team_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
            }

            let members = repository
                .delete_where::<PlayerEntity, _>(|player| {
                    player.team_id.as_deref() == Some(team_id.as_str())
                })
                .await?;
            let teams = repository
                .delete_where::<TeamEntity, _>(|team| team.team_id == team_id)
                .await?;
            info!(%team_id, members, "team deleted");
            Ok(DeleteResponse::new(members + teams))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::JoinMode,
        services::test_support::{ready_state, seed_session},
    };

    fn request(session: &str, name: &str) -> CreateTeamRequest {
        CreateTeamRequest {
            session_id: session.into(),
            team_name: name.into(),
            password: "pw".into(),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn team_names_are_unique_per_session() {
        let (state, _) = ready_state().await;
        seed_session(&state, "ABC123", PlayerMode::Teams).await;
        seed_session(&state, "XYZ789", PlayerMode::Both).await;

        create_team(&state, request("ABC123", "Reds")).await.unwrap();
        let err = create_team(&state, request("ABC123", " Reds "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        create_team(&state, request("XYZ789", "Reds")).await.unwrap();

        let teams = list_teams(&state, "abc123").await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].created_by, TeamCreator::Host);
        assert_eq!(teams[0].password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn single_sessions_reject_teams() {
        let (state, _) = ready_state().await;
        seed_session(&state, "ABC123", PlayerMode::Single).await;
        let err = create_team(&state, request("ABC123", "Reds"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn validate_team_checks_password() {
        let (state, _) = ready_state().await;
        seed_session(&state, "ABC123", PlayerMode::Teams).await;
        create_team(&state, request("ABC123", "Reds")).await.unwrap();

        let check = |password: &str| ValidateTeamRequest {
            session_id: "ABC123".into(),
            team_name: "Reds".into(),
            password: password.into(),
        };
        assert!(validate_team(&state, check("pw")).await.unwrap().is_valid);
        assert!(!validate_team(&state, check("nope")).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn delete_team_removes_members() {
        let (state, repository) = ready_state().await;
        seed_session(&state, "ABC123", PlayerMode::Teams).await;
        let team = create_team(&state, request("ABC123", "Reds")).await.unwrap();
        repository
            .insert(&PlayerEntity {
                player_id: "p1".into(),
                session_id: "ABC123".into(),
                team_id: Some(team.team_id.clone()),
                player_name: "ann".into(),
                join_mode: JoinMode::ExistingTeam,
                created_at: String::new(),
            })
            .await
            .unwrap();

        let response = delete_team(&state, &team.team_id).await.unwrap();
        assert_eq!(response.deleted, 2);
        assert!(list_teams(&state, "ABC123").await.unwrap().is_empty());
        assert!(matches!(
            delete_team(&state, &team.team_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
