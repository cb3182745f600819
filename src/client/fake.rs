//! In-memory [`GameApi`] used by the reconciliation tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use futures::{FutureExt, future::BoxFuture};
use reqwest::StatusCode;

use crate::{
    client::{
        api::GameApi,
        error::{ClientError, ClientResult},
    },
    dao::models::{JoinMode, PlayerMode, TeamCreator, clock_time},
    dto::{
        player::PlayerSummary,
        session::{SessionStatus, SessionSummary},
        tap::{TapRequest, TapResponse, TapSummary},
        team::TeamSummary,
    },
};

#[derive(Default)]
struct Backend {
    session: Option<SessionSummary>,
    taps: Vec<TapSummary>,
    teams: Vec<TeamSummary>,
    players: Vec<PlayerSummary>,
    fail_taps: bool,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    backend: Mutex<Backend>,
    tap_calls: AtomicUsize,
    session_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn with_session(round: u32) -> Arc<Self> {
        let api = Self::default();
        api.backend.lock().unwrap().session = Some(SessionSummary {
            session_id: "ABC123".into(),
            host_username: "host".into(),
            player_mode: PlayerMode::Both,
            round,
            status: SessionStatus::Active,
            created_at: "2024-01-01T00:00:00Z".into(),
        });
        Arc::new(api)
    }

    pub(crate) fn without_session() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_session_mut(&self, update: impl FnOnce(&mut SessionSummary)) {
        if let Some(session) = self.backend.lock().unwrap().session.as_mut() {
            update(session);
        }
    }

    pub(crate) fn set_round(&self, round: u32) {
        self.with_session_mut(|session| session.round = round);
    }

    pub(crate) fn complete(&self) {
        self.with_session_mut(|session| session.status = SessionStatus::Completed);
    }

    pub(crate) fn push_tap(&self, player_name: &str, round: u32, timestamp: i64) {
        let mut backend = self.backend.lock().unwrap();
        let tap_id = format!("tap-{}", backend.taps.len());
        backend.taps.push(TapSummary {
            tap_id,
            session_id: "ABC123".into(),
            player_name: player_name.into(),
            team_name: None,
            round,
            timestamp,
            time: clock_time(timestamp),
        });
    }

    pub(crate) fn clear_taps(&self) {
        self.backend.lock().unwrap().taps.clear();
    }

    pub(crate) fn fail_taps(&self, fail: bool) {
        self.backend.lock().unwrap().fail_taps = fail;
    }

    pub(crate) fn add_team(&self, team_id: &str, team_name: &str) {
        self.backend.lock().unwrap().teams.push(TeamSummary {
            team_id: team_id.into(),
            session_id: "ABC123".into(),
            team_name: team_name.into(),
            password: Some("pw".into()),
            created_by: TeamCreator::Host,
            created_at: String::new(),
        });
    }

    pub(crate) fn add_player(&self, player_name: &str, team_id: Option<&str>) {
        let join_mode = match team_id {
            Some(_) => JoinMode::ExistingTeam,
            None => JoinMode::Single,
        };
        self.backend.lock().unwrap().players.push(PlayerSummary {
            player_id: format!("p-{player_name}"),
            session_id: "ABC123".into(),
            player_name: player_name.into(),
            team_id: team_id.map(str::to_string),
            join_mode,
            created_at: String::new(),
            team_info: None,
        });
    }

    pub(crate) fn tap_calls(&self) -> usize {
        self.tap_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    fn ordered(backend: &Backend, round: u32) -> Vec<TapSummary> {
        let mut taps: Vec<TapSummary> = backend
            .taps
            .iter()
            .filter(|tap| tap.round == round)
            .cloned()
            .collect();
        taps.sort_by_key(|tap| tap.timestamp);
        taps
    }

    fn record(&self, request: TapRequest) -> ClientResult<TapResponse> {
        self.tap_calls.fetch_add(1, Ordering::SeqCst);
        let mut backend = self.backend.lock().unwrap();
        if backend.fail_taps {
            return Err(ClientError::Status {
                path: "/api/taps".into(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "degraded mode".into(),
            });
        }

        let order = Self::ordered(&backend, request.round);
        if let Some(index) = order
            .iter()
            .position(|tap| tap.player_name == request.player_name)
        {
            return Ok(TapResponse {
                tap: order[index].clone(),
                position: index + 1,
                already_tapped: true,
            });
        }

        let timestamp = backend.taps.iter().map(|tap| tap.timestamp).max().unwrap_or(0) + 1;
        let tap = TapSummary {
            tap_id: format!("tap-{}", backend.taps.len()),
            session_id: request.session_id,
            player_name: request.player_name,
            team_name: request.team_name,
            round: request.round,
            timestamp,
            time: clock_time(timestamp),
        };
        backend.taps.push(tap.clone());
        Ok(TapResponse {
            tap,
            position: order.len() + 1,
            already_tapped: false,
        })
    }
}

impl GameApi for FakeApi {
    fn session(&self, _session_id: &str) -> BoxFuture<'static, ClientResult<Option<SessionSummary>>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        let session = self.backend.lock().unwrap().session.clone();
        async move { Ok(session) }.boxed()
    }

    fn tap_order(
        &self,
        _session_id: &str,
        round: u32,
    ) -> BoxFuture<'static, ClientResult<Vec<TapSummary>>> {
        let taps = Self::ordered(&self.backend.lock().unwrap(), round);
        async move { Ok(taps) }.boxed()
    }

    fn add_tap(&self, tap: TapRequest) -> BoxFuture<'static, ClientResult<TapResponse>> {
        let result = self.record(tap);
        async move { result }.boxed()
    }

    fn teams(&self, _session_id: &str) -> BoxFuture<'static, ClientResult<Vec<TeamSummary>>> {
        let teams = self.backend.lock().unwrap().teams.clone();
        async move { Ok(teams) }.boxed()
    }

    fn players(&self, _session_id: &str) -> BoxFuture<'static, ClientResult<Vec<PlayerSummary>>> {
        let players = self.backend.lock().unwrap().players.clone();
        async move { Ok(players) }.boxed()
    }
}
