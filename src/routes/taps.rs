use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::{
        sheets::DeleteResponse,
        tap::{TapRequest, TapResponse, TapSummary},
    },
    error::{AppError, JsonBody},
    services::tap_service,
    state::SharedState,
};

/// Buzzer press routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/taps", post(record_tap))
        .route("/api/taps/{id}", delete(clear_taps))
        .route("/api/taps/{id}/{round}", get(tap_order))
}

/// Record a buzzer press. A second press in the same round returns the first one.
#[utoipa::path(
    post,
    path = "/api/taps",
    tag = "taps",
    request_body = TapRequest,
    responses(
        (status = 200, description = "Tap recorded or already present", body = TapResponse),
        (status = 404, description = "Unknown session or player"),
        (status = 409, description = "Stale round or completed session")
    )
)]
pub async fn record_tap(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<TapRequest>,
) -> Result<Json<TapResponse>, AppError> {
    payload.validate()?;
    Ok(Json(tap_service::record_tap(&state, payload).await?))
}

/// Taps of one round in arrival order.
#[utoipa::path(
    get,
    path = "/api/taps/{id}/{round}",
    tag = "taps",
    params(
        ("id" = String, Path, description = "Session join code"),
        ("round" = u32, Path, description = "Round number")
    ),
    responses((status = 200, description = "Ordered taps", body = [TapSummary]))
)]
pub async fn tap_order(
    State(state): State<SharedState>,
    Path((session_id, round)): Path<(String, u32)>,
) -> Result<Json<Vec<TapSummary>>, AppError> {
    Ok(Json(tap_service::tap_order(&state, &session_id, round).await?))
}

/// Clear the taps of every round of a session.
#[utoipa::path(
    delete,
    path = "/api/taps/{id}",
    tag = "taps",
    params(("id" = String, Path, description = "Session join code")),
    responses((status = 200, description = "Taps cleared", body = DeleteResponse))
)]
pub async fn clear_taps(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(tap_service::clear_taps(&state, &session_id).await?))
}
