use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::Stamp;

/// Whether the spreadsheet backend is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// RFC 3339 time of the check.
    pub checked_at: String,
}

impl HealthResponse {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            checked_at: Stamp::now().rfc3339,
        }
    }
}
