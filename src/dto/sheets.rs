use serde::Serialize;
use utoipa::ToSchema;

/// Acknowledgement returned by destructive routes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    /// Number of rows removed across every sheet.
    pub deleted: usize,
}

impl DeleteResponse {
    pub fn new(deleted: usize) -> Self {
        Self {
            success: true,
            deleted,
        }
    }
}
