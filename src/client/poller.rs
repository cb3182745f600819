use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, watch},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::client::{
    PollOutcome,
    error::ClientResult,
    host::{HostSync, HostView},
    player::{PlayerSync, PlayerView},
};

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Why a poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    Completed,
    Shutdown,
}

/// A view that can be refreshed from the backend.
pub trait Reconciler: Send {
    type View: Clone + PartialEq + Send + Sync;

    /// One reconciliation pass; `silent` is set on every pass after the first.
    fn refresh(&mut self, silent: bool) -> impl Future<Output = ClientResult<PollOutcome>> + Send;

    fn snapshot(&self) -> Self::View;
}

impl Reconciler for PlayerSync {
    type View = PlayerView;

    async fn refresh(&mut self, silent: bool) -> ClientResult<PollOutcome> {
        self.poll(silent).await
    }

    fn snapshot(&self) -> PlayerView {
        self.view()
    }
}

impl Reconciler for HostSync {
    type View = HostView;

    async fn refresh(&mut self, _silent: bool) -> ClientResult<PollOutcome> {
        self.poll().await
    }

    fn snapshot(&self) -> HostView {
        self.view()
    }
}

/// Poll `sync` every `every` until the session completes or `shutdown` flips to true.
///
/// A new view is published on `updates` only when it differs from the last one.
/// Each poll is awaited before the next tick, so polls never overlap; ticks missed
/// while a slow poll runs are skipped rather than bunched up.
pub async fn run<R: Reconciler>(
    sync: Arc<Mutex<R>>,
    every: Duration,
    updates: watch::Sender<R::View>,
    mut shutdown: watch::Receiver<bool>,
) -> Stopped {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut silent = false;

    loop {
        if *shutdown.borrow() {
            return Stopped::Shutdown;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("shutdown sender dropped; stopping poller");
                    return Stopped::Shutdown;
                }
                continue;
            }
        }

        let (outcome, view) = {
            let mut guard = sync.lock().await;
            let outcome = guard.refresh(silent).await;
            (outcome, guard.snapshot())
        };
        silent = true;

        updates.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });

        match outcome {
            Ok(PollOutcome::Completed) => {
                info!("session completed; poller stopping");
                return Stopped::Completed;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "poll failed; keeping last state"),
        }
    }
}

/// Drive a player's view.
pub async fn run_player(
    sync: Arc<Mutex<PlayerSync>>,
    every: Duration,
    updates: watch::Sender<PlayerView>,
    shutdown: watch::Receiver<bool>,
) -> Stopped {
    run(sync, every, updates, shutdown).await
}

/// Drive the host's view.
pub async fn run_host(
    sync: Arc<Mutex<HostSync>>,
    every: Duration,
    updates: watch::Sender<HostView>,
    shutdown: watch::Receiver<bool>,
) -> Stopped {
    run(sync, every, updates, shutdown).await
}
