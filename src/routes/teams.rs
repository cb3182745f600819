use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::{
        host::ValidationResponse,
        sheets::DeleteResponse,
        team::{CreateTeamRequest, CreateTeamResponse, TeamSummary, ValidateTeamRequest},
    },
    error::{AppError, JsonBody},
    services::team_service,
    state::SharedState,
};

/// Team management routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/teams", post(create_team))
        .route("/api/teams/validate", post(validate_team))
        .route("/api/teams/session/{id}", get(list_teams))
        .route("/api/teams/{id}", delete(delete_team))
}

/// Create a team inside a session.
#[utoipa::path(
    post,
    path = "/api/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created", body = CreateTeamResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Duplicate name or session does not accept teams")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CreateTeamRequest>,
) -> Result<Json<CreateTeamResponse>, AppError> {
    payload.validate()?;
    Ok(Json(team_service::create_team(&state, payload).await?))
}

/// Check a team password.
#[utoipa::path(
    post,
    path = "/api/teams/validate",
    tag = "teams",
    request_body = ValidateTeamRequest,
    responses((status = 200, description = "Whether the password matches", body = ValidationResponse))
)]
pub async fn validate_team(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ValidateTeamRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    payload.validate()?;
    Ok(Json(team_service::validate_team(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/teams/session/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Session join code")),
    responses((status = 200, description = "Teams of the session", body = [TeamSummary]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<TeamSummary>>, AppError> {
    Ok(Json(team_service::list_teams(&state, &session_id).await?))
}

/// Delete a team and its members. Recorded taps are kept.
#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team deleted", body = DeleteResponse),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(team_service::delete_team(&state, &team_id).await?))
}
