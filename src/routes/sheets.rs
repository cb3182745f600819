use axum::{
    Json, Router,
    extract::{Path, State},
    routing::delete,
};

use crate::{
    dto::sheets::DeleteResponse, error::AppError, services::sheets_service, state::SharedState,
};

/// Raw maintenance over the spreadsheet tabs.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/sheets/{sheet}/column/{column}/value/{value}",
        delete(delete_rows),
    )
}

/// Delete every row of a sheet whose column holds the given value.
#[utoipa::path(
    delete,
    path = "/api/sheets/{sheet}/column/{column}/value/{value}",
    tag = "sheets",
    params(
        ("sheet" = String, Path, description = "Sheet name, e.g. `Sessions`"),
        ("column" = String, Path, description = "Header of the column to match"),
        ("value" = String, Path, description = "Cell value to match")
    ),
    responses(
        (status = 200, description = "Rows deleted", body = DeleteResponse),
        (status = 400, description = "Unknown sheet or column")
    )
)]
pub async fn delete_rows(
    State(state): State<SharedState>,
    Path((sheet, column, value)): Path<(String, String, String)>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(
        sheets_service::delete_rows_by_column(&state, &sheet, &column, &value).await?,
    ))
}
