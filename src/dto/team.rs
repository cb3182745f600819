use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{TeamCreator, TeamEntity},
    dto::validation::{validate_not_blank, validate_session_code},
};

/// Payload used to register a team inside a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(custom(function = "validate_session_code"))]
    pub session_id: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub team_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub password: String,
    /// Defaults to `host`.
    #[serde(default)]
    pub created_by: Option<TeamCreator>,
}

/// Identifier of a freshly created team.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamResponse {
    pub team_id: String,
}

/// Credentials a player supplies to join an existing team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTeamRequest {
    #[validate(custom(function = "validate_session_code"))]
    pub session_id: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub team_name: String,
    pub password: String,
}

/// Team listing entry.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub team_id: String,
    pub session_id: String,
    pub team_name: String,
    /// Only present for host-created teams, whose password the host hands out.
    #[serde(default)]
    pub password: Option<String>,
    pub created_by: TeamCreator,
    pub created_at: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        let password = (team.created_by == TeamCreator::Host).then_some(team.password);
        Self {
            team_id: team.team_id,
            session_id: team.session_id,
            team_name: team.team_name,
            password,
            created_by: team.created_by,
            created_at: team.created_at,
        }
    }
}
