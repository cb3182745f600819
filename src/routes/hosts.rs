use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::{
        host::{HostCredentials, HostSummary, ValidationResponse},
        sheets::DeleteResponse,
        stats::{HostStatistics, StatisticsQuery},
    },
    error::{AppError, JsonBody},
    routes::export::host_export,
    services::{host_service, stats_service},
    state::SharedState,
};

/// Host accounts, their dashboard statistics and CSV export.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/hosts", post(create_host))
        .route("/api/hosts/validate", post(validate_host))
        .route("/api/hosts/{username}", delete(delete_host))
        .route("/api/hosts/{username}/statistics", get(host_statistics))
        .route("/api/hosts/{username}/export", get(host_export))
}

/// Register a new host account.
#[utoipa::path(
    post,
    path = "/api/hosts",
    tag = "hosts",
    request_body = HostCredentials,
    responses(
        (status = 200, description = "Host created", body = HostSummary),
        (status = 400, description = "Blank username or password"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_host(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<HostCredentials>,
) -> Result<Json<HostSummary>, AppError> {
    payload.validate()?;
    Ok(Json(host_service::create_host(&state, payload).await?))
}

/// Check host credentials.
#[utoipa::path(
    post,
    path = "/api/hosts/validate",
    tag = "hosts",
    request_body = HostCredentials,
    responses((status = 200, description = "Whether the credentials match", body = ValidationResponse))
)]
pub async fn validate_host(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<HostCredentials>,
) -> Result<Json<ValidationResponse>, AppError> {
    payload.validate()?;
    Ok(Json(host_service::validate_host(&state, payload).await?))
}

/// Delete a host together with every session it owns.
#[utoipa::path(
    delete,
    path = "/api/hosts/{username}",
    tag = "hosts",
    params(("username" = String, Path, description = "Host username")),
    responses(
        (status = 200, description = "Host deleted", body = DeleteResponse),
        (status = 404, description = "Unknown host")
    )
)]
pub async fn delete_host(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(host_service::delete_host(&state, &username).await?))
}

/// Aggregated statistics over the host's sessions.
#[utoipa::path(
    get,
    path = "/api/hosts/{username}/statistics",
    tag = "statistics",
    params(
        ("username" = String, Path, description = "Host username"),
        StatisticsQuery
    ),
    responses(
        (status = 200, description = "Dashboard statistics", body = HostStatistics),
        (status = 404, description = "Unknown host")
    )
)]
pub async fn host_statistics(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<HostStatistics>, AppError> {
    let statistics = stats_service::host_statistics(&state, &username, query.timeframe).await?;
    Ok(Json(statistics))
}
