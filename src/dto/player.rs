use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{JoinMode, PlayerEntity, TeamEntity},
    dto::validation::{validate_not_blank, validate_session_code},
};

/// Payload sent by the join wizard.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinPlayerRequest {
    #[validate(custom(function = "validate_session_code"))]
    pub session_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub player_name: String,
    pub join_mode: JoinMode,
}

/// Identifier of the joined player; `existing` is set when the name was already taken
/// and the player rejoined under it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinPlayerResponse {
    pub player_id: String,
    pub existing: bool,
}

/// Team a player belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub team_id: String,
    pub team_name: String,
}

impl From<&TeamEntity> for TeamInfo {
    fn from(team: &TeamEntity) -> Self {
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
        }
    }
}

/// Player listing entry, with team details resolved when the player has one.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: String,
    pub session_id: String,
    pub player_name: String,
    #[serde(default)]
    pub team_id: Option<String>,
    pub join_mode: JoinMode,
    pub created_at: String,
    #[serde(default)]
    pub team_info: Option<TeamInfo>,
}

impl PlayerSummary {
    /// Build a summary, looking the player's team up in `teams`.
    pub fn with_teams(player: PlayerEntity, teams: &[TeamEntity]) -> Self {
        let team_info = player.team_id.as_deref().and_then(|team_id| {
            teams
                .iter()
                .find(|team| team.team_id == team_id)
                .map(TeamInfo::from)
        });
        Self {
            player_id: player.player_id,
            session_id: player.session_id,
            player_name: player.player_name,
            team_id: player.team_id,
            join_mode: player.join_mode,
            created_at: player.created_at,
            team_info,
        }
    }

    /// Solo participant: no team or joined in single mode.
    pub fn is_solo(&self) -> bool {
        self.team_id.is_none() || self.join_mode == JoinMode::Single
    }
}

/// Response of the player existence check.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerExistsResponse {
    pub success: bool,
    pub exists: bool,
}

/// Response of the player lookup by name.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLookupResponse {
    pub success: bool,
    pub player: PlayerSummary,
}
