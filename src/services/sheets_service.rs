use tracing::info;

use crate::{
    dao::models::Sheet, dto::sheets::DeleteResponse, error::ServiceError, state::SharedState,
};

/// Delete every row of `sheet_name` whose `column_name` cell equals `value`.
pub async fn delete_rows_by_column(
    state: &SharedState,
    sheet_name: &str,
    column_name: &str,
    value: &str,
) -> Result<DeleteResponse, ServiceError> {
    let sheet = Sheet::from_name(sheet_name)
        .ok_or_else(|| ServiceError::InvalidInput(format!("unknown sheet `{sheet_name}`")))?;
    let column = column_name.to_string();
    let value = value.trim().to_string();

    state
        .run_write(move |repository| async move {
            let deleted = repository.delete_by_cell(sheet, &column, &value).await?;
            info!(%sheet, %column, deleted, "rows deleted by column value");
            Ok(DeleteResponse::new(deleted))
        })
        .await
}
