//! Row models persisted in the spreadsheet, one sheet per entity.
//!
//! Every sheet starts with a header row; the column order listed in
//! [`Sheet::headers`] is the storage contract shared with the browser front-end
//! and with any spreadsheet already populated by earlier deployments.

use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use utoipa::ToSchema;

/// Named sheets making up the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Hosts,
    Sessions,
    Teams,
    Players,
    TapOrder,
}

impl Sheet {
    /// Every sheet, in creation order.
    pub const ALL: [Sheet; 5] = [
        Sheet::Hosts,
        Sheet::Sessions,
        Sheet::Teams,
        Sheet::Players,
        Sheet::TapOrder,
    ];

    /// Title of the sheet inside the spreadsheet.
    pub fn name(self) -> &'static str {
        match self {
            Sheet::Hosts => "Hosts",
            Sheet::Sessions => "Sessions",
            Sheet::Teams => "Teams",
            Sheet::Players => "Players",
            Sheet::TapOrder => "TapOrder",
        }
    }

    /// Header row written when the sheet is created.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Sheet::Hosts => &["username", "password", "createdAt"],
            Sheet::Sessions => &[
                "sessionId",
                "hostUsername",
                "playerMode",
                "round",
                "createdAt",
                "active",
            ],
            Sheet::Teams => &[
                "teamId",
                "sessionId",
                "teamName",
                "password",
                "createdBy",
                "createdAt",
            ],
            Sheet::Players => &[
                "playerId",
                "sessionId",
                "teamId",
                "playerName",
                "joinMode",
                "createdAt",
            ],
            Sheet::TapOrder => &[
                "tapId",
                "sessionId",
                "playerName",
                "teamName",
                "round",
                "timestamp",
                "time",
            ],
        }
    }

    /// Resolve a sheet from its title.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sheet| sheet.name() == name)
    }

    /// Index of a column given its header name.
    pub fn column_index(self, column: &str) -> Option<usize> {
        self.headers().iter().position(|header| *header == column)
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which kinds of participants a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMode {
    /// Solo players only.
    Single,
    /// Players must join an existing team.
    Teams,
    /// Solo players and teams are both accepted.
    Both,
}

impl PlayerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerMode::Single => "single",
            PlayerMode::Teams => "teams",
            PlayerMode::Both => "both",
        }
    }

    /// Label used by the dashboards.
    pub fn label(self) -> &'static str {
        match self {
            PlayerMode::Single => "Single Players",
            PlayerMode::Teams => "Teams Only",
            PlayerMode::Both => "Mixed Mode",
        }
    }
}

impl FromStr for PlayerMode {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(PlayerMode::Single),
            "teams" => Ok(PlayerMode::Teams),
            "both" => Ok(PlayerMode::Both),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// How a player entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    Single,
    ExistingTeam,
    NewTeam,
}

impl JoinMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinMode::Single => "single",
            JoinMode::ExistingTeam => "existing_team",
            JoinMode::NewTeam => "new_team",
        }
    }

    pub fn is_team(self) -> bool {
        !matches!(self, JoinMode::Single)
    }
}

impl FromStr for JoinMode {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(JoinMode::Single),
            "existing_team" => Ok(JoinMode::ExistingTeam),
            "new_team" => Ok(JoinMode::NewTeam),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Who created a team, which decides whether its password is shown to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamCreator {
    Host,
    Player,
}

impl TeamCreator {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamCreator::Host => "host",
            TeamCreator::Player => "player",
        }
    }
}

/// Enum cell holding a value this build does not know about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

/// Registered host account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntity {
    pub username: String,
    /// Salted SHA-256 digest, see `services::host_service::hash_password`.
    pub password: String,
    pub created_at: String,
}

/// One buzzer game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntity {
    /// Six character join code.
    pub session_id: String,
    pub host_username: String,
    pub player_mode: PlayerMode,
    pub round: u32,
    pub created_at: String,
    /// `false` once the host marked the session completed.
    pub active: bool,
}

/// Team registered inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntity {
    pub team_id: String,
    pub session_id: String,
    pub team_name: String,
    pub password: String,
    pub created_by: TeamCreator,
    pub created_at: String,
}

/// Participant of a session, optionally attached to a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntity {
    pub player_id: String,
    pub session_id: String,
    pub team_id: Option<String>,
    pub player_name: String,
    pub join_mode: JoinMode,
    pub created_at: String,
}

/// A recorded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapEntity {
    pub tap_id: String,
    pub session_id: String,
    pub player_name: String,
    pub team_name: Option<String>,
    pub round: u32,
    /// Unix milliseconds at which the backend received the tap.
    pub timestamp: i64,
    /// Wall-clock `HH:MM:SS` rendering of `timestamp`.
    pub time: String,
}

/// Conversion between a typed entity and its spreadsheet row.
pub trait SheetRow: Sized {
    const SHEET: Sheet;

    fn to_row(&self) -> Vec<String>;

    /// Decode a row, returning `None` for blank or truncated rows (cleared rows
    /// are left behind by spreadsheet edits and must be skipped).
    fn from_row(row: &[String]) -> Option<Self>;
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}

fn required(row: &[String], index: usize) -> Option<String> {
    let value = cell(row, index);
    (!value.is_empty()).then(|| value.to_string())
}

fn optional(row: &[String], index: usize) -> Option<String> {
    required(row, index)
}

fn parse_round(value: &str) -> u32 {
    value.parse::<u32>().ok().filter(|round| *round > 0).unwrap_or(1)
}

impl SheetRow for HostEntity {
    const SHEET: Sheet = Sheet::Hosts;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.password.clone(),
            self.created_at.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            username: required(row, 0)?,
            password: cell(row, 1).to_string(),
            created_at: cell(row, 2).to_string(),
        })
    }
}

impl SheetRow for SessionEntity {
    const SHEET: Sheet = Sheet::Sessions;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.session_id.clone(),
            self.host_username.clone(),
            self.player_mode.as_str().to_string(),
            self.round.to_string(),
            self.created_at.clone(),
            self.active.to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            session_id: required(row, 0)?,
            host_username: cell(row, 1).to_string(),
            player_mode: cell(row, 2).parse().unwrap_or(PlayerMode::Both),
            round: parse_round(cell(row, 3)),
            created_at: cell(row, 4).to_string(),
            active: !cell(row, 5).eq_ignore_ascii_case("false"),
        })
    }
}

impl SheetRow for TeamEntity {
    const SHEET: Sheet = Sheet::Teams;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.team_id.clone(),
            self.session_id.clone(),
            self.team_name.clone(),
            self.password.clone(),
            self.created_by.as_str().to_string(),
            self.created_at.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Option<Self> {
        let created_by = match cell(row, 4) {
            "player" => TeamCreator::Player,
            _ => TeamCreator::Host,
        };
        Some(Self {
            team_id: required(row, 0)?,
            session_id: required(row, 1)?,
            team_name: required(row, 2)?,
            password: cell(row, 3).to_string(),
            created_by,
            created_at: cell(row, 5).to_string(),
        })
    }
}

impl SheetRow for PlayerEntity {
    const SHEET: Sheet = Sheet::Players;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.player_id.clone(),
            self.session_id.clone(),
            self.team_id.clone().unwrap_or_default(),
            self.player_name.clone(),
            self.join_mode.as_str().to_string(),
            self.created_at.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Option<Self> {
        let team_id = optional(row, 2);
        let join_mode = cell(row, 4).parse().unwrap_or(if team_id.is_some() {
            JoinMode::ExistingTeam
        } else {
            JoinMode::Single
        });
        Some(Self {
            player_id: required(row, 0)?,
            session_id: required(row, 1)?,
            team_id,
            player_name: required(row, 3)?,
            join_mode,
            created_at: cell(row, 5).to_string(),
        })
    }
}

impl SheetRow for TapEntity {
    const SHEET: Sheet = Sheet::TapOrder;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.tap_id.clone(),
            self.session_id.clone(),
            self.player_name.clone(),
            self.team_name.clone().unwrap_or_default(),
            self.round.to_string(),
            self.timestamp.to_string(),
            self.time.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            tap_id: required(row, 0)?,
            session_id: required(row, 1)?,
            player_name: required(row, 2)?,
            team_name: optional(row, 3),
            round: parse_round(cell(row, 4)),
            timestamp: cell(row, 5).parse().ok()?,
            time: cell(row, 6).to_string(),
        })
    }
}

/// Instant captured once and rendered in every format the rows need.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub millis: i64,
    pub rfc3339: String,
    pub clock: String,
}

impl Stamp {
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }
}

impl From<SystemTime> for Stamp {
    fn from(time: SystemTime) -> Self {
        let datetime = OffsetDateTime::from(time);
        let millis = (datetime.unix_timestamp_nanos() / 1_000_000) as i64;
        Self {
            millis,
            rfc3339: datetime
                .format(&Rfc3339)
                .unwrap_or_else(|_| "invalid-timestamp".into()),
            clock: format_clock(datetime),
        }
    }
}

/// Render a unix-millisecond timestamp as `HH:MM:SS` (UTC).
pub fn clock_time(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map(format_clock)
        .unwrap_or_default()
}

fn format_clock(datetime: OffsetDateTime) -> String {
    datetime
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// Parse an RFC 3339 `createdAt` cell.
pub fn parse_created_at(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn headers_match_row_width() {
        let session = SessionEntity {
            session_id: "ABC123".into(),
            host_username: "host".into(),
            player_mode: PlayerMode::Teams,
            round: 3,
            created_at: "2024-01-01T00:00:00Z".into(),
            active: true,
        };
        assert_eq!(session.to_row().len(), Sheet::Sessions.headers().len());

        let tap = TapEntity {
            tap_id: "t".into(),
            session_id: "ABC123".into(),
            player_name: "ann".into(),
            team_name: None,
            round: 1,
            timestamp: 1,
            time: "00:00:00".into(),
        };
        assert_eq!(tap.to_row().len(), Sheet::TapOrder.headers().len());
    }

    #[test]
    fn session_row_is_parsed_leniently() {
        let parsed =
            SessionEntity::from_row(&row(&["ABC123", "host", "mystery", "abc", "", "TRUE"]))
                .unwrap();
        assert_eq!(parsed.player_mode, PlayerMode::Both);
        assert_eq!(parsed.round, 1);
        assert!(parsed.active);

        let completed =
            SessionEntity::from_row(&row(&["ABC123", "host", "single", "4", "", "false"])).unwrap();
        assert_eq!(completed.round, 4);
        assert!(!completed.active);
    }

    #[test]
    fn blank_rows_are_skipped() {
        assert!(SessionEntity::from_row(&row(&["", "", ""])).is_none());
        assert!(TapEntity::from_row(&row(&["t1", "ABC123", "ann", "", "1", "nan", ""])).is_none());
        assert!(PlayerEntity::from_row(&[]).is_none());
    }

    #[test]
    fn team_without_creator_defaults_to_host() {
        let team = TeamEntity::from_row(&row(&["t1", "ABC123", "Reds", "pw"])).unwrap();
        assert_eq!(team.created_by, TeamCreator::Host);
    }

    #[test]
    fn player_join_mode_falls_back_on_team_presence() {
        let player =
            PlayerEntity::from_row(&row(&["p1", "ABC123", "t1", "ann", "", ""])).unwrap();
        assert_eq!(player.join_mode, JoinMode::ExistingTeam);
        assert_eq!(player.team_id.as_deref(), Some("t1"));
    }

    #[test]
    fn sheet_lookup_by_name_and_column() {
        assert_eq!(Sheet::from_name("TapOrder"), Some(Sheet::TapOrder));
        assert_eq!(Sheet::from_name("tapOrder"), None);
        assert_eq!(Sheet::Players.column_index("teamId"), Some(2));
        assert_eq!(Sheet::Players.column_index("nope"), None);
    }

    #[test]
    fn clock_time_renders_utc() {
        assert_eq!(clock_time(0), "00:00:00");
        assert_eq!(clock_time(3_723_000), "01:02:03");
    }
}
