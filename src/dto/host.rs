use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::HostEntity, dto::validation::validate_not_blank};

/// Username and password pair used to register or log in a host.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HostCredentials {
    #[validate(custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub password: String,
}

/// Host account as exposed by the API; the password digest never leaves the server.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostSummary {
    pub username: String,
    pub created_at: String,
}

impl From<HostEntity> for HostSummary {
    fn from(host: HostEntity) -> Self {
        Self {
            username: host.username,
            created_at: host.created_at,
        }
    }
}

/// Outcome of a credentials check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub is_valid: bool,
}
