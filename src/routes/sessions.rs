use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::{
        player::{PlayerExistsResponse, PlayerLookupResponse},
        session::{AdvanceRoundRequest, CreateSessionRequest, SessionSummary, UpdateModeRequest},
        sheets::DeleteResponse,
    },
    error::{AppError, JsonBody},
    services::session_service,
    state::SharedState,
};

/// Session lifecycle routes.
///
/// `/api/sessions/{id}` is keyed by host username on `GET` and by join code on
/// `DELETE`, mirroring the browser client.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(list_host_sessions).delete(delete_session),
        )
        .route("/api/sessions/{id}/round", put(advance_round))
        .route("/api/sessions/{id}/mode", put(update_mode))
        .route("/api/sessions/{id}/complete", put(complete_session))
        .route("/api/session/{id}", get(get_session))
        .route("/api/session/{id}/player/{name}", get(find_player))
        .route("/api/session/{id}/player/{name}/exists", get(player_exists))
}

/// Open a session, or update the mode of an existing one owned by the same host.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created or updated", body = SessionSummary),
        (status = 404, description = "Unknown host"),
        (status = 409, description = "Join code owned by another host")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    payload.validate()?;
    Ok(Json(session_service::create_session(&state, payload).await?))
}

/// List the sessions of a host.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Host username")),
    responses((status = 200, description = "Sessions of the host", body = [SessionSummary]))
)]
pub async fn list_host_sessions(
    State(state): State<SharedState>,
    Path(host_username): Path<String>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(
        session_service::list_host_sessions(&state, &host_username).await?,
    ))
}

/// Fetch one session; polled by host and player views.
#[utoipa::path(
    get,
    path = "/api/session/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session join code")),
    responses(
        (status = 200, description = "Session", body = SessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::get_session(&state, &session_id).await?))
}

/// Move the session to a later round.
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/round",
    tag = "sessions",
    params(("id" = String, Path, description = "Session join code")),
    request_body = AdvanceRoundRequest,
    responses(
        (status = 200, description = "Round advanced", body = SessionSummary),
        (status = 409, description = "Round does not increase or session completed")
    )
)]
pub async fn advance_round(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    JsonBody(payload): JsonBody<AdvanceRoundRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::advance_round(&state, &session_id, payload).await?,
    ))
}

/// Change which participants the session accepts.
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/mode",
    tag = "sessions",
    params(("id" = String, Path, description = "Session join code")),
    request_body = UpdateModeRequest,
    responses((status = 200, description = "Mode updated", body = SessionSummary))
)]
pub async fn update_mode(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateModeRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(
        session_service::update_mode(&state, &session_id, payload.player_mode).await?,
    ))
}

/// Close the session; pollers stop once they observe it.
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/complete",
    tag = "sessions",
    params(("id" = String, Path, description = "Session join code")),
    responses((status = 200, description = "Session completed", body = SessionSummary))
)]
pub async fn complete_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(
        session_service::complete_session(&state, &session_id).await?,
    ))
}

/// Delete a session with its taps, players and teams.
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session join code")),
    responses((status = 200, description = "Session deleted", body = DeleteResponse))
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(session_service::delete_session(&state, &session_id).await?))
}

/// Whether a player name is taken in the session.
#[utoipa::path(
    get,
    path = "/api/session/{id}/player/{name}/exists",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session join code"),
        ("name" = String, Path, description = "Player name")
    ),
    responses((status = 200, description = "Lookup result", body = PlayerExistsResponse))
)]
pub async fn player_exists(
    State(state): State<SharedState>,
    Path((session_id, player_name)): Path<(String, String)>,
) -> Result<Json<PlayerExistsResponse>, AppError> {
    Ok(Json(
        session_service::player_exists(&state, &session_id, &player_name).await?,
    ))
}

/// Fetch a player of the session with its team, if any.
#[utoipa::path(
    get,
    path = "/api/session/{id}/player/{name}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session join code"),
        ("name" = String, Path, description = "Player name")
    ),
    responses(
        (status = 200, description = "Player", body = PlayerLookupResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn find_player(
    State(state): State<SharedState>,
    Path((session_id, player_name)): Path<(String, String)>,
) -> Result<Json<PlayerLookupResponse>, AppError> {
    Ok(Json(
        session_service::find_player(&state, &session_id, &player_name).await?,
    ))
}
