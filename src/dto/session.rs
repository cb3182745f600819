use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{PlayerMode, SessionEntity},
    dto::validation::{validate_not_blank, validate_session_code},
};

/// Payload used to open a session (or update the mode of an existing one).
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Join code chosen by the host; a fresh one is generated when omitted.
    #[serde(default)]
    #[validate(custom(function = "validate_session_code"))]
    pub session_id: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub host_username: String,
    pub player_mode: PlayerMode,
}

/// Request to move a session to another round.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRoundRequest {
    /// Target round; the next round is used when omitted.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub round: Option<u32>,
}

/// Request to switch the participants a session accepts.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModeRequest {
    pub player_mode: PlayerMode,
}

/// Lifecycle of a session as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Session state polled by host and player views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub host_username: String,
    pub player_mode: PlayerMode,
    pub round: u32,
    pub status: SessionStatus,
    pub created_at: String,
}

impl SessionSummary {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

impl From<SessionEntity> for SessionSummary {
    fn from(session: SessionEntity) -> Self {
        Self {
            status: if session.active {
                SessionStatus::Active
            } else {
                SessionStatus::Completed
            },
            session_id: session.session_id,
            host_username: session.host_username,
            player_mode: session.player_mode,
            round: session.round,
            created_at: session.created_at,
        }
    }
}

/// Optional round selector for leaderboard exports.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    pub round: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn completed_status_derives_from_active_flag() {
        let summary = SessionSummary::from(SessionEntity {
            session_id: "ABC123".into(),
            host_username: "host".into(),
            player_mode: PlayerMode::Both,
            round: 2,
            created_at: String::new(),
            active: false,
        });
        assert!(summary.is_completed());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["playerMode"], "both");
    }

    #[test]
    fn create_request_rejects_malformed_code() {
        let request: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "sessionId": "AB-123",
            "hostUsername": "host",
            "playerMode": "single"
        }))
        .unwrap();
        assert!(request.validate().is_err());

        let generated: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "hostUsername": "host",
            "playerMode": "teams"
        }))
        .unwrap();
        assert!(generated.validate().is_ok());
        assert!(generated.session_id.is_none());
    }

    #[test]
    fn advance_round_rejects_zero() {
        assert!(AdvanceRoundRequest { round: Some(0) }.validate().is_err());
        assert!(AdvanceRoundRequest { round: None }.validate().is_ok());
    }
}
