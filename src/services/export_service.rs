//! CSV exports for sessions, leaderboards and host statistics.

use std::{borrow::Cow, collections::BTreeMap};

use crate::{
    dao::models::{SessionEntity, TapEntity},
    error::ServiceError,
    services::{
        input::lookup_code,
        session_service::load_session,
        stats_service::{SessionData, host_session_data, load_session_data, session_statistics},
        tap_service::order_taps,
    },
    state::SharedState,
};

const MISSING: &str = "N/A";

/// Rendered CSV document and the file name offered to the browser.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

/// Minimal RFC 4180 writer: cells holding a comma, quote or line break are quoted.
#[derive(Default)]
struct CsvWriter {
    out: String,
}

impl CsvWriter {
    fn line(&mut self, text: &str) -> &mut Self {
        self.record(&[text])
    }

    fn record(&mut self, cells: &[&str]) -> &mut Self {
        for (index, cell) in cells.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.out.push_str(&escape(cell));
        }
        self.out.push('\n');
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

fn escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

fn taps_by_round(taps: &[TapEntity]) -> BTreeMap<u32, Vec<TapEntity>> {
    let mut rounds: BTreeMap<u32, Vec<TapEntity>> = BTreeMap::new();
    for tap in taps {
        rounds.entry(tap.round).or_default().push(tap.clone());
    }
    rounds
        .into_iter()
        .map(|(round, taps)| (round, order_taps(taps)))
        .collect()
}

fn leaderboard_rows(csv: &mut CsvWriter, round: u32, taps: &[TapEntity]) {
    csv.line(&format!("Round {round} Leaderboard"));
    csv.record(&["Position", "Player Name", "Team Name", "Time"]);
    for (index, tap) in taps.iter().enumerate() {
        csv.record(&[
            &(index + 1).to_string(),
            &tap.player_name,
            or_missing(tap.team_name.as_deref()),
            &tap.time,
        ]);
    }
}

/// Full dump of one session: settings, teams, players and every round's results.
pub fn render_session(data: &SessionData) -> String {
    let session = &data.session;
    let mut csv = CsvWriter::default();
    csv.line("Session Export").blank();

    csv.line("Session Information")
        .record(&[
            "Session ID",
            "Host",
            "Player Mode",
            "Current Round",
            "Created At",
            "Active",
        ])
        .record(&[
            &session.session_id,
            &session.host_username,
            session.player_mode.as_str(),
            &session.round.to_string(),
            &session.created_at,
            &session.active.to_string(),
        ])
        .blank();

    if !data.teams.is_empty() {
        csv.line("Teams").record(&["Team ID", "Team Name", "Created At"]);
        for team in &data.teams {
            csv.record(&[&team.team_id, &team.team_name, &team.created_at]);
        }
        csv.blank();
    }

    csv.line("Players").record(&[
        "Player ID",
        "Player Name",
        "Team ID",
        "Join Mode",
        "Created At",
    ]);
    for player in &data.players {
        csv.record(&[
            &player.player_id,
            &player.player_name,
            or_missing(player.team_id.as_deref()),
            player.join_mode.as_str(),
            &player.created_at,
        ]);
    }
    csv.blank();

    for (round, taps) in taps_by_round(&data.taps) {
        csv.line(&format!("Round {round} Results")).record(&[
            "Position",
            "Player Name",
            "Team Name",
            "Time",
            "Timestamp",
        ]);
        for (index, tap) in taps.iter().enumerate() {
            csv.record(&[
                &(index + 1).to_string(),
                &tap.player_name,
                or_missing(tap.team_name.as_deref()),
                &tap.time,
                &tap.timestamp.to_string(),
            ]);
        }
        csv.blank();
    }

    csv.finish()
}

/// Leaderboard of one round, or of every round when `round` is `None`.
pub fn render_leaderboard(session: &SessionEntity, taps: &[TapEntity], round: Option<u32>) -> String {
    let mut csv = CsvWriter::default();
    csv.line(&format!("Leaderboard Export - Session {}", session.session_id))
        .blank();

    let rounds = taps_by_round(taps);
    match round {
        Some(round) => {
            let taps = rounds.get(&round).map(Vec::as_slice).unwrap_or_default();
            leaderboard_rows(&mut csv, round, taps);
        }
        None => {
            for (round, taps) in &rounds {
                leaderboard_rows(&mut csv, *round, taps);
                csv.blank();
            }
        }
    }
    csv.finish()
}

/// One line of statistics per session of a host.
pub fn render_host_statistics(sessions: &[SessionData]) -> String {
    let mut csv = CsvWriter::default();
    csv.line("Host Statistics Export")
        .blank()
        .line("Session Statistics")
        .record(&[
            "Session ID",
            "Player Mode",
            "Total Players",
            "Total Teams",
            "Total Rounds",
            "Total Taps",
            "Average Response Time",
            "Created At",
        ]);
    for data in sessions {
        let stats = session_statistics(data);
        csv.record(&[
            &stats.session_id,
            stats.player_mode.as_str(),
            &stats.total_players.to_string(),
            &stats.total_teams.to_string(),
            &stats.total_rounds.to_string(),
            &stats.total_taps.to_string(),
            &format!("{}ms", stats.average_response_time),
            &stats.created_at,
        ]);
    }
    csv.finish()
}

pub async fn export_session(state: &SharedState, session_id: &str) -> Result<CsvExport, ServiceError> {
    let session_id = lookup_code(session_id);
    let repository = state.repository().await?;
    let session = load_session(&repository, &session_id).await?.entity;
    let data = load_session_data(&repository, vec![session])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;

    Ok(CsvExport {
        filename: format!("session_{session_id}_export.csv"),
        body: render_session(&data),
    })
}

pub async fn export_leaderboard(
    state: &SharedState,
    session_id: &str,
    round: Option<u32>,
) -> Result<CsvExport, ServiceError> {
    let session_id = lookup_code(session_id);
    let repository = state.repository().await?;
    let session = load_session(&repository, &session_id).await?.entity;
    let taps = repository
        .list_where::<TapEntity, _>(|tap| {
            tap.session_id == session_id && round.is_none_or(|round| tap.round == round)
        })
        .await?;

    let filename = match round {
        Some(round) => format!("leaderboard_{session_id}_round_{round}.csv"),
        None => format!("leaderboard_{session_id}.csv"),
    };
    Ok(CsvExport {
        filename,
        body: render_leaderboard(&session, &taps, round),
    })
}

pub async fn export_host_statistics(
    state: &SharedState,
    username: &str,
) -> Result<CsvExport, ServiceError> {
    let username = username.trim();
    let repository = state.repository().await?;
    let sessions = host_session_data(&repository, username).await?;
    Ok(CsvExport {
        filename: format!("host_{username}_statistics.csv"),
        body: render_host_statistics(&sessions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{JoinMode, PlayerEntity, PlayerMode, TeamCreator, TeamEntity};

    fn session() -> SessionEntity {
        SessionEntity {
            session_id: "ABC123".into(),
            host_username: "host".into(),
            player_mode: PlayerMode::Both,
            round: 2,
            created_at: "2024-01-01T00:00:00Z".into(),
            active: true,
        }
    }

    fn tap(name: &str, team: Option<&str>, round: u32, timestamp: i64) -> TapEntity {
        TapEntity {
            tap_id: format!("{name}{round}"),
            session_id: "ABC123".into(),
            player_name: name.into(),
            team_name: team.map(str::to_string),
            round,
            timestamp,
            time: "12:00:00".into(),
        }
    }

    #[test]
    fn cells_with_separators_are_quoted() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn session_export_lists_rounds_in_order() {
        let data = SessionData {
            session: session(),
            teams: vec![TeamEntity {
                team_id: "t1".into(),
                session_id: "ABC123".into(),
                team_name: "Reds, Inc".into(),
                password: "pw".into(),
                created_by: TeamCreator::Host,
                created_at: "x".into(),
            }],
            players: vec![PlayerEntity {
                player_id: "p1".into(),
                session_id: "ABC123".into(),
                team_id: None,
                player_name: "ann".into(),
                join_mode: JoinMode::Single,
                created_at: "y".into(),
            }],
            taps: vec![
                tap("bob", None, 2, 50),
                tap("ann", None, 1, 30),
                tap("cid", Some("Reds"), 1, 10),
            ],
        };

        let csv = render_session(&data);
        assert!(csv.starts_with("Session Export\n\nSession Information\n"));
        assert!(csv.contains("ABC123,host,both,2,2024-01-01T00:00:00Z,true\n"));
        assert!(csv.contains("t1,\"Reds, Inc\",x\n"));
        assert!(csv.contains("p1,ann,N/A,single,y\n"));
        let round_one = csv.find("Round 1 Results").unwrap();
        let round_two = csv.find("Round 2 Results").unwrap();
        assert!(round_one < round_two);
        assert!(csv.contains("1,cid,Reds,12:00:00,10\n2,ann,N/A,12:00:00,30\n"));
    }

    #[test]
    fn leaderboard_for_single_round() {
        let taps = [tap("ann", None, 1, 30), tap("bob", None, 1, 20)];
        let csv = render_leaderboard(&session(), &taps, Some(1));
        assert_eq!(
            csv,
            "Leaderboard Export - Session ABC123\n\n\
             Round 1 Leaderboard\n\
             Position,Player Name,Team Name,Time\n\
             1,bob,N/A,12:00:00\n\
             2,ann,N/A,12:00:00\n"
        );
    }

    #[test]
    fn leaderboard_for_missing_round_has_only_headers() {
        let csv = render_leaderboard(&session(), &[], Some(3));
        assert!(csv.ends_with("Round 3 Leaderboard\nPosition,Player Name,Team Name,Time\n"));
    }

    #[test]
    fn host_statistics_rows_use_milliseconds() {
        let data = SessionData {
            session: session(),
            teams: vec![],
            players: vec![],
            taps: vec![tap("ann", None, 1, 1), tap("bob", None, 1, 2)],
        };
        let csv = render_host_statistics(&[data]);
        assert!(csv.contains("ABC123,both,0,0,2,2,150ms,2024-01-01T00:00:00Z\n"));
    }
}
