use axum::{
    Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    dto::session::LeaderboardQuery,
    error::AppError,
    services::export_service::{self, CsvExport},
    state::SharedState,
};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Session and leaderboard CSV downloads. The host export lives under the host routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/sessions/{id}/export", get(session_export))
        .route(
            "/api/sessions/{id}/leaderboard.csv",
            get(leaderboard_export),
        )
}

impl IntoResponse for CsvExport {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Download a full session as CSV.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/export",
    tag = "export",
    params(("id" = String, Path, description = "Session join code")),
    responses(
        (status = 200, description = "Session CSV", content_type = "text/csv", body = String),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn session_export(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<CsvExport, AppError> {
    Ok(export_service::export_session(&state, &session_id).await?)
}

/// Download the leaderboard of one round, or of every round.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/leaderboard.csv",
    tag = "export",
    params(
        ("id" = String, Path, description = "Session join code"),
        LeaderboardQuery
    ),
    responses(
        (status = 200, description = "Leaderboard CSV", content_type = "text/csv", body = String),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn leaderboard_export(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<CsvExport, AppError> {
    Ok(export_service::export_leaderboard(&state, &session_id, query.round).await?)
}

/// Download per-session statistics of a host as CSV.
#[utoipa::path(
    get,
    path = "/api/hosts/{username}/export",
    tag = "export",
    params(("username" = String, Path, description = "Host username")),
    responses(
        (status = 200, description = "Host statistics CSV", content_type = "text/csv", body = String),
        (status = 404, description = "Unknown host")
    )
)]
pub async fn host_export(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<CsvExport, AppError> {
    Ok(export_service::export_host_statistics(&state, &username).await?)
}
