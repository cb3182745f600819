//! Dashboard statistics over a host's sessions.
//!
//! The figures are deliberately coarse: "response time" is the mean of
//! `position * 100` over every tap, which rewards sessions where players tap early
//! in the order rather than measuring latency.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use time::{Duration, OffsetDateTime};

use crate::{
    dao::{
        models::{HostEntity, PlayerEntity, SessionEntity, TapEntity, TeamEntity, parse_created_at},
        repository::Repository,
    },
    dto::stats::{
        ActivityPoint, HostStatistics, ModeShare, SessionStatistics, StatisticsOverview,
        Timeframe, TopSession,
    },
    error::ServiceError,
    state::SharedState,
};

const TOP_SESSIONS: usize = 5;

/// Every row attached to one session.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub session: SessionEntity,
    pub teams: Vec<TeamEntity>,
    pub players: Vec<PlayerEntity>,
    pub taps: Vec<TapEntity>,
}

/// Gather teams, players and taps for `sessions`, reading each sheet once.
pub(crate) async fn load_session_data(
    repository: &Repository,
    sessions: Vec<SessionEntity>,
) -> Result<Vec<SessionData>, ServiceError> {
    let wanted: HashSet<String> = sessions.iter().map(|s| s.session_id.clone()).collect();

    let mut teams = bucket(
        repository
            .list_where::<TeamEntity, _>(|team| wanted.contains(&team.session_id))
            .await?,
        |team| team.session_id.clone(),
    );
    let mut players = bucket(
        repository
            .list_where::<PlayerEntity, _>(|player| wanted.contains(&player.session_id))
            .await?,
        |player| player.session_id.clone(),
    );
    let mut taps = bucket(
        repository
            .list_where::<TapEntity, _>(|tap| wanted.contains(&tap.session_id))
            .await?,
        |tap| tap.session_id.clone(),
    );

    Ok(sessions
        .into_iter()
        .map(|session| SessionData {
            teams: teams.remove(&session.session_id).unwrap_or_default(),
            players: players.remove(&session.session_id).unwrap_or_default(),
            taps: taps.remove(&session.session_id).unwrap_or_default(),
            session,
        })
        .collect())
}

fn bucket<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> HashMap<String, Vec<T>> {
    let mut buckets: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        buckets.entry(key(&item)).or_default().push(item);
    }
    buckets
}

/// `numerator / denominator` rounded half up, 0 when the denominator is 0.
fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        0
    } else {
        (numerator as f64 / denominator as f64).round() as u64
    }
}

fn percentage(part: usize, whole: usize) -> u32 {
    rounded_ratio(part as u64 * 100, whole as u64) as u32
}

/// Mean of `position * 100` over every tap, positions counted per round.
pub fn average_response_time(taps: &[TapEntity]) -> u64 {
    let mut per_round: BTreeMap<u32, u64> = BTreeMap::new();
    for tap in taps {
        *per_round.entry(tap.round).or_default() += 1;
    }
    let (total, count) = per_round
        .values()
        .fold((0u64, 0u64), |(total, count), &taps_in_round| {
            let positions: u64 = (1..=taps_in_round).sum();
            (total + positions * 100, count + taps_in_round)
        });
    rounded_ratio(total, count)
}

/// Percentage of players that tapped at least once.
pub fn participation_rate(players: &[PlayerEntity], taps: &[TapEntity]) -> u32 {
    let tappers: HashSet<&str> = taps.iter().map(|tap| tap.player_name.as_str()).collect();
    percentage(tappers.len(), players.len())
}

pub fn session_statistics(data: &SessionData) -> SessionStatistics {
    SessionStatistics {
        session_id: data.session.session_id.clone(),
        player_mode: data.session.player_mode,
        created_at: data.session.created_at.clone(),
        total_players: data.players.len(),
        total_teams: data.teams.len(),
        total_rounds: data.session.round,
        total_taps: data.taps.len(),
        average_response_time: average_response_time(&data.taps),
        participation_rate: participation_rate(&data.players, &data.taps),
    }
}

/// Whether a session created at `created_at` falls inside `timeframe`.
/// Unparsable dates only count towards the all-time view.
pub fn within_timeframe(created_at: &str, timeframe: Timeframe, now: OffsetDateTime) -> bool {
    let Some(days) = timeframe.days() else {
        return true;
    };
    parse_created_at(created_at).is_some_and(|created| created >= now - Duration::days(days))
}

fn activity_date(created_at: &str) -> String {
    match parse_created_at(created_at) {
        Some(created) => created.date().to_string(),
        None => created_at.chars().take(10).collect(),
    }
}

/// Fold per-session figures into the dashboard payload.
pub fn aggregate(sessions: Vec<SessionStatistics>) -> HostStatistics {
    let total_sessions = sessions.len();
    let total_players: usize = sessions.iter().map(|s| s.total_players).sum();
    let total_teams: usize = sessions.iter().map(|s| s.total_teams).sum();
    let total_taps: usize = sessions.iter().map(|s| s.total_taps).sum();
    let total_rounds: u64 = sessions.iter().map(|s| u64::from(s.total_rounds)).sum();

    let overview = StatisticsOverview {
        total_sessions,
        total_players,
        total_teams,
        total_taps,
        total_rounds,
        average_players_per_session: rounded_ratio(total_players as u64, total_sessions as u64),
        average_taps_per_session: rounded_ratio(total_taps as u64, total_sessions as u64),
        average_rounds_per_session: rounded_ratio(total_rounds, total_sessions as u64),
    };

    let session_activity = sessions
        .iter()
        .map(|s| ActivityPoint {
            date: activity_date(&s.created_at),
            sessions: 1,
            players: s.total_players,
            taps: s.total_taps,
        })
        .collect();

    let mut modes: IndexMap<_, usize> = IndexMap::new();
    for session in &sessions {
        *modes.entry(session.player_mode).or_default() += 1;
    }
    let player_mode_data = modes
        .into_iter()
        .map(|(mode, count)| ModeShare {
            name: mode.label().to_string(),
            value: count,
            percentage: percentage(count, total_sessions),
        })
        .collect();

    let mut busiest: Vec<&SessionStatistics> = sessions.iter().collect();
    busiest.sort_by(|a, b| b.total_taps.cmp(&a.total_taps));
    let top_sessions = busiest
        .into_iter()
        .take(TOP_SESSIONS)
        .map(|s| TopSession {
            session_id: s.session_id.clone(),
            players: s.total_players,
            taps: s.total_taps,
            rounds: s.total_rounds,
            participation_rate: s.participation_rate,
        })
        .collect();

    HostStatistics {
        overview,
        session_activity,
        player_mode_data,
        top_sessions,
        sessions,
    }
}

/// Sessions of `username` with their rows, or `NotFound` for an unknown host.
pub(crate) async fn host_session_data(
    repository: &Repository,
    username: &str,
) -> Result<Vec<SessionData>, ServiceError> {
    if repository
        .find::<HostEntity, _>(|host| host.username == username)
        .await?
        .is_none()
    {
        return Err(ServiceError::NotFound(format!("host `{username}` not found")));
    }
    let sessions = repository
        .list_where::<SessionEntity, _>(|session| session.host_username == username)
        .await?;
    load_session_data(repository, sessions).await
}

pub async fn host_statistics(
    state: &SharedState,
    username: &str,
    timeframe: Timeframe,
) -> Result<HostStatistics, ServiceError> {
    let repository = state.repository().await?;
    let now = OffsetDateTime::now_utc();
    let sessions = host_session_data(&repository, username.trim())
        .await?
        .iter()
        .filter(|data| within_timeframe(&data.session.created_at, timeframe, now))
        .map(session_statistics)
        .collect();
    Ok(aggregate(sessions))
}
