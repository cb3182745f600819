use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dao::models::PlayerMode;

/// Window of sessions taken into account by host statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Timeframe {
    /// Length of the window in days, `None` for all time.
    pub fn days(self) -> Option<i64> {
        match self {
            Timeframe::All => None,
            Timeframe::Week => Some(7),
            Timeframe::Month => Some(30),
            Timeframe::Quarter => Some(90),
        }
    }
}

/// Query string of the statistics route.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// Per-session aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub session_id: String,
    pub player_mode: PlayerMode,
    pub created_at: String,
    pub total_players: usize,
    pub total_teams: usize,
    pub total_rounds: u32,
    pub total_taps: usize,
    /// Mean of `position * 100` over every tap of every round.
    pub average_response_time: u64,
    /// Percentage of players that tapped at least once.
    pub participation_rate: u32,
}

/// Totals and rounded per-session averages over the selected sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsOverview {
    pub total_sessions: usize,
    pub total_players: usize,
    pub total_teams: usize,
    pub total_taps: usize,
    pub total_rounds: u64,
    pub average_players_per_session: u64,
    pub average_taps_per_session: u64,
    pub average_rounds_per_session: u64,
}

/// One bar of the activity chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoint {
    /// `YYYY-MM-DD` creation date of the session.
    pub date: String,
    pub sessions: u32,
    pub players: usize,
    pub taps: usize,
}

/// Share of sessions using a player mode.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModeShare {
    pub name: String,
    pub value: usize,
    pub percentage: u32,
}

/// Leaderboard entry of the busiest sessions.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSession {
    pub session_id: String,
    pub players: usize,
    pub taps: usize,
    pub rounds: u32,
    pub participation_rate: u32,
}

/// Dashboard payload for one host.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostStatistics {
    pub overview: StatisticsOverview,
    pub session_activity: Vec<ActivityPoint>,
    pub player_mode_data: Vec<ModeShare>,
    pub top_sessions: Vec<TopSession>,
    pub sessions: Vec<SessionStatistics>,
}
