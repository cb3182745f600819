use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Report the storage status, probing the spreadsheet when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_sheet_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "spreadsheet health check failed");
                return HealthResponse::new(HealthStatus::Degraded);
            }
        }
        Err(_) => warn!("spreadsheet unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::new(HealthStatus::Degraded)
    } else {
        HealthResponse::new(HealthStatus::Ok)
    }
}
