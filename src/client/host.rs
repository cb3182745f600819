use std::sync::Arc;

use tracing::info;

use crate::{
    client::{PollOutcome, api::GameApi, diff::Tracked, error::ClientResult},
    dto::{player::PlayerSummary, session::SessionSummary, tap::TapSummary, team::TeamSummary},
};

/// Reconciled state of the host's live session screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostView {
    pub session: Option<SessionSummary>,
    pub tap_order: Vec<TapSummary>,
    pub teams: Vec<TeamSummary>,
    pub players: Vec<PlayerSummary>,
    pub selected_team: Option<String>,
    pub team_players: Vec<PlayerSummary>,
    pub session_not_found: bool,
}

/// Keeps the host's view of one session in step with the backend.
pub struct HostSync {
    api: Arc<dyn GameApi>,
    session_id: String,
    session: Tracked<Option<SessionSummary>>,
    tap_order: Tracked<Vec<TapSummary>>,
    teams: Tracked<Vec<TeamSummary>>,
    players: Tracked<Vec<PlayerSummary>>,
    selected_team: Option<String>,
    team_players: Vec<PlayerSummary>,
    session_not_found: bool,
}

impl HostSync {
    pub fn new(api: Arc<dyn GameApi>, session_id: &str) -> Self {
        Self {
            api,
            session_id: session_id.trim().to_ascii_uppercase(),
            session: Tracked::default(),
            tap_order: Tracked::default(),
            teams: Tracked::default(),
            players: Tracked::default(),
            selected_team: None,
            team_players: Vec::new(),
            session_not_found: false,
        }
    }

    pub fn view(&self) -> HostView {
        HostView {
            session: self.session.get().clone(),
            tap_order: self.tap_order.get().clone(),
            teams: self.teams.get().clone(),
            players: self.players.get().clone(),
            selected_team: self.selected_team.clone(),
            team_players: self.team_players.clone(),
            session_not_found: self.session_not_found,
        }
    }

    /// Players that play on their own.
    pub fn solo_players(&self) -> Vec<PlayerSummary> {
        self.players
            .get()
            .iter()
            .filter(|player| player.is_solo())
            .cloned()
            .collect()
    }

    /// Focus the member list on one team, or clear it.
    pub fn select_team(&mut self, team_id: Option<&str>) {
        self.selected_team = team_id.map(str::to_string);
        self.refresh_team_players();
    }

    fn refresh_team_players(&mut self) {
        self.team_players = match &self.selected_team {
            Some(team_id) => self
                .players
                .get()
                .iter()
                .filter(|player| player.team_id.as_deref() == Some(team_id.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }

    /// Refresh the session, then tap order, teams and players side by side.
    pub async fn poll(&mut self) -> ClientResult<PollOutcome> {
        let Some(session) = self.api.session(&self.session_id).await? else {
            self.session_not_found = true;
            return Ok(PollOutcome::NotFound);
        };
        self.session_not_found = false;

        let completed = session.is_completed();
        let round = session.round;
        self.session.update(Some(session));
        if completed {
            info!(session = %self.session_id, "session completed");
            return Ok(PollOutcome::Completed);
        }

        let (order, teams, players) = tokio::join!(
            self.api.tap_order(&self.session_id, round),
            self.api.teams(&self.session_id),
            self.api.players(&self.session_id),
        );
        self.tap_order.update(order?);
        self.teams.update(teams?);
        if self.players.update(players?) {
            self.refresh_team_players();
        }
        Ok(PollOutcome::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeApi;

    #[tokio::test]
    async fn poll_loads_everything() {
        let api = FakeApi::with_session(1);
        api.add_team("t1", "Reds");
        api.add_player("ann", Some("t1"));
        api.add_player("bob", None);
        api.push_tap("bob", 1, 1);

        let mut sync = HostSync::new(api.clone(), "abc123");
        assert_eq!(sync.poll().await.unwrap(), PollOutcome::Active);
        let view = sync.view();
        assert_eq!(view.teams.len(), 1);
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.tap_order[0].player_name, "bob");

        let solo: Vec<String> = sync.solo_players().into_iter().map(|p| p.player_name).collect();
        assert_eq!(solo, ["bob"]);
    }

    #[tokio::test]
    async fn selected_team_follows_new_players() {
        let api = FakeApi::with_session(1);
        api.add_team("t1", "Reds");
        api.add_player("ann", Some("t1"));
        let mut sync = HostSync::new(api.clone(), "ABC123");
        sync.poll().await.unwrap();

        sync.select_team(Some("t1"));
        assert_eq!(sync.view().team_players.len(), 1);

        api.add_player("cid", Some("t1"));
        sync.poll().await.unwrap();
        assert_eq!(sync.view().team_players.len(), 2);

        sync.select_team(None);
        assert!(sync.view().team_players.is_empty());
    }

    #[tokio::test]
    async fn unchanged_poll_keeps_view() {
        let api = FakeApi::with_session(1);
        let mut sync = HostSync::new(api.clone(), "ABC123");
        sync.poll().await.unwrap();
        let before = sync.view();
        sync.poll().await.unwrap();
        assert_eq!(before, sync.view());
    }

    #[tokio::test]
    async fn completed_and_missing_sessions() {
        let api = FakeApi::without_session();
        let mut sync = HostSync::new(api, "ABC123");
        assert_eq!(sync.poll().await.unwrap(), PollOutcome::NotFound);
        assert!(sync.view().session_not_found);

        let api = FakeApi::with_session(2);
        api.complete();
        let mut sync = HostSync::new(api, "ABC123");
        assert_eq!(sync.poll().await.unwrap(), PollOutcome::Completed);
    }
}
