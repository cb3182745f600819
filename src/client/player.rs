use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    client::{
        PollOutcome,
        api::GameApi,
        diff::Tracked,
        error::{ClientError, ClientResult},
    },
    dao::models::Stamp,
    dto::{
        session::SessionSummary,
        tap::{TapRequest, TapSummary},
    },
};

/// How long the "already tapped" notice stays up.
pub const ALREADY_TAPPED_NOTICE: Duration = Duration::from_secs(3);

/// What a press turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// The tap was recorded at this 1-based position.
    Recorded { position: usize },
    /// The player had already tapped this round.
    AlreadyTapped { position: usize },
}

/// Reconciled state shown by a player's buzzer screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerView {
    pub session: Option<SessionSummary>,
    pub tap_order: Vec<TapSummary>,
    pub has_pressed: bool,
    pub press_time: Option<String>,
    pub my_position: Option<usize>,
    pub show_already_tapped: bool,
    pub session_not_found: bool,
}

/// Keeps one player's view of a session in step with the backend.
pub struct PlayerSync {
    api: Arc<dyn GameApi>,
    session_id: String,
    player_name: String,
    team_name: Option<String>,
    session: Tracked<Option<SessionSummary>>,
    tap_order: Tracked<Vec<TapSummary>>,
    current_round: Option<u32>,
    has_pressed: bool,
    press_time: Option<String>,
    my_position: Option<usize>,
    already_tapped_at: Option<Instant>,
    session_not_found: bool,
    last_updated: Option<OffsetDateTime>,
}

impl PlayerSync {
    pub fn new(
        api: Arc<dyn GameApi>,
        session_id: &str,
        player_name: &str,
        team_name: Option<&str>,
    ) -> Self {
        Self {
            api,
            session_id: session_id.trim().to_ascii_uppercase(),
            player_name: player_name.trim().to_string(),
            team_name: team_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            session: Tracked::default(),
            tap_order: Tracked::default(),
            current_round: None,
            has_pressed: false,
            press_time: None,
            my_position: None,
            already_tapped_at: None,
            session_not_found: false,
            last_updated: None,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            session: self.session.get().clone(),
            tap_order: self.tap_order.get().clone(),
            has_pressed: self.has_pressed,
            press_time: self.press_time.clone(),
            my_position: self.my_position,
            show_already_tapped: self.already_tapped_at.is_some(),
            session_not_found: self.session_not_found,
        }
    }

    /// Time of the last successful reconciliation.
    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    pub fn current_round(&self) -> Option<u32> {
        self.current_round
    }

    fn own_tap(&self) -> Option<(usize, &TapSummary)> {
        self.tap_order
            .get()
            .iter()
            .enumerate()
            .find(|(_, tap)| tap.player_name == self.player_name)
    }

    fn flag_already_tapped(&mut self) {
        self.already_tapped_at = Some(Instant::now());
    }

    fn reset_press(&mut self) {
        self.has_pressed = false;
        self.press_time = None;
        self.my_position = None;
    }

    /// Refresh session and tap order.
    ///
    /// A silent poll keeps the previous state when the session disappears instead
    /// of flagging it as not found; background ticks poll silently.
    pub async fn poll(&mut self, silent: bool) -> ClientResult<PollOutcome> {
        let Some(session) = self.api.session(&self.session_id).await? else {
            if silent {
                warn!(session = %self.session_id, "session missing on background poll");
            } else {
                self.session_not_found = true;
            }
            return Ok(PollOutcome::NotFound);
        };
        self.session_not_found = false;

        if session.is_completed() {
            info!(session = %self.session_id, "session completed");
            self.session.update(Some(session));
            return Ok(PollOutcome::Completed);
        }

        if self.current_round != Some(session.round) {
            if let Some(previous) = self.current_round {
                debug!(previous, round = session.round, "round changed; clearing press state");
            }
            self.reset_press();
            self.already_tapped_at = None;
            self.current_round = Some(session.round);
        }
        if self
            .already_tapped_at
            .is_some_and(|at| at.elapsed() >= ALREADY_TAPPED_NOTICE)
        {
            self.already_tapped_at = None;
        }
        let round = session.round;
        self.session.update(Some(session));

        let order = self.api.tap_order(&self.session_id, round).await?;
        self.tap_order.update(order);

        match self.own_tap() {
            Some((index, tap)) => {
                let time = tap.time.clone();
                self.has_pressed = true;
                self.press_time = Some(time);
                self.my_position = Some(index + 1);
            }
            None if self.has_pressed => self.reset_press(),
            None => {}
        }

        self.last_updated = Some(OffsetDateTime::now_utc());
        Ok(PollOutcome::Active)
    }

    /// Press the buzzer for the current round.
    ///
    /// The press is shown immediately and rolled back when the submission fails.
    /// A tap the backend reports as already present keeps the backend's position
    /// and is not appended locally; the next poll brings the order in line.
    pub async fn press(&mut self) -> ClientResult<PressOutcome> {
        if let Some((index, _)) = self.own_tap() {
            self.flag_already_tapped();
            return Ok(PressOutcome::AlreadyTapped { position: index + 1 });
        }
        let round = self.current_round.ok_or(ClientError::SessionNotLoaded)?;

        let pressed_at = Stamp::now();
        self.has_pressed = true;
        self.press_time = Some(pressed_at.clock);

        let request = TapRequest {
            session_id: self.session_id.clone(),
            player_name: self.player_name.clone(),
            team_name: self.team_name.clone(),
            round,
        };
        let response = match self.api.add_tap(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "tap submission failed; rolling back");
                self.reset_press();
                return Err(err);
            }
        };

        self.press_time = Some(response.tap.time.clone());
        if response.already_tapped {
            self.flag_already_tapped();
            self.my_position = Some(response.position);
            return Ok(PressOutcome::AlreadyTapped {
                position: response.position,
            });
        }

        let mut order = self.tap_order.get().clone();
        if !order.iter().any(|tap| tap.tap_id == response.tap.tap_id) {
            order.push(response.tap);
            order.sort_by_key(|tap| tap.timestamp);
        }
        self.tap_order.update(order);

        let position = self
            .own_tap()
            .map(|(index, _)| index + 1)
            .unwrap_or(response.position);
        self.my_position = Some(position);
        Ok(PressOutcome::Recorded { position })
    }
}
