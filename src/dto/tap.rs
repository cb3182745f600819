use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::TapEntity,
    dto::validation::{validate_not_blank, validate_session_code},
};

/// Button press submitted by a player.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TapRequest {
    #[validate(custom(function = "validate_session_code"))]
    pub session_id: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub player_name: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[validate(range(min = 1))]
    pub round: u32,
}

/// A recorded tap, as listed in a round's order.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TapSummary {
    pub tap_id: String,
    pub session_id: String,
    pub player_name: String,
    #[serde(default)]
    pub team_name: Option<String>,
    pub round: u32,
    /// Unix milliseconds.
    pub timestamp: i64,
    /// `HH:MM:SS` rendering of `timestamp`.
    pub time: String,
}

impl From<TapEntity> for TapSummary {
    fn from(tap: TapEntity) -> Self {
        Self {
            tap_id: tap.tap_id,
            session_id: tap.session_id,
            player_name: tap.player_name,
            team_name: tap.team_name,
            round: tap.round,
            timestamp: tap.timestamp,
            time: tap.time,
        }
    }
}

/// Result of a tap submission. `already_tapped` reports that the player had tapped
/// earlier in the round; `tap` and `position` then describe that earlier tap.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TapResponse {
    pub tap: TapSummary,
    /// 1-based rank in the round.
    pub position: usize,
    pub already_tapped: bool,
}
