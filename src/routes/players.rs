use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        player::{JoinPlayerRequest, JoinPlayerResponse, PlayerSummary},
        sheets::DeleteResponse,
    },
    error::{AppError, JsonBody},
    services::player_service,
    state::SharedState,
};

/// Player join and removal routes. `/api/players/{id}` takes a join code on
/// `GET` and a player id on `DELETE`.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/players", post(join_session))
        .route("/api/players/{id}", get(list_players).delete(delete_player))
}

/// Join a session, or rejoin under an existing name.
#[utoipa::path(
    post,
    path = "/api/players",
    tag = "players",
    request_body = JoinPlayerRequest,
    responses(
        (status = 200, description = "Player joined", body = JoinPlayerResponse),
        (status = 404, description = "Unknown session or team"),
        (status = 409, description = "Join mode not accepted by the session")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<JoinPlayerRequest>,
) -> Result<Json<JoinPlayerResponse>, AppError> {
    payload.validate()?;
    Ok(Json(player_service::join_session(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/players/{id}",
    tag = "players",
    params(("id" = String, Path, description = "Session join code")),
    responses((status = 200, description = "Players of the session", body = [PlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    Ok(Json(player_service::list_players(&state, &session_id).await?))
}

/// Remove a player and the taps they recorded.
#[utoipa::path(
    delete,
    path = "/api/players/{id}",
    tag = "players",
    params(("id" = String, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player deleted", body = DeleteResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(player_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(player_service::delete_player(&state, &player_id).await?))
}
