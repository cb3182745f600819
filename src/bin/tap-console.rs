//! Terminal buzzer: `tap-console <SESSION> <PLAYER> [TEAM]`.
//!
//! Polls the session as a player, prints the round's order whenever it changes
//! and taps on every Enter key.

use std::{env, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    sync::{Mutex, watch},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tapbattle_back::{
    client::{
        api::ApiClient,
        player::{PlayerSync, PlayerView, PressOutcome},
        poller::{Stopped, run_player},
    },
    config::AppConfig,
};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,tapbattle_back=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_view(view: &PlayerView) {
    if view.session_not_found {
        println!("session not found");
        return;
    }
    let Some(session) = &view.session else {
        return;
    };
    println!("--- round {} ---", session.round);
    for (index, tap) in view.tap_order.iter().enumerate() {
        let team = tap.team_name.as_deref().unwrap_or("-");
        println!("{:>3}. {:<20} {:<16} {}", index + 1, tap.player_name, team, tap.time);
    }
    match view.my_position {
        Some(position) => println!("you are #{position}"),
        None => println!("press Enter to tap"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let (Some(session_id), Some(player_name)) = (args.next(), args.next()) else {
        bail!("usage: tap-console <SESSION> <PLAYER> [TEAM]");
    };
    let team_name = args.next();

    let config = AppConfig::load();
    let api = ApiClient::from_env().context("building API client")?;
    info!(api = api.base_url(), session = %session_id, player = %player_name, "joining as player");

    let sync = Arc::new(Mutex::new(PlayerSync::new(
        Arc::new(api),
        &session_id,
        &player_name,
        team_name.as_deref(),
    )));
    let (updates, mut views) = watch::channel(PlayerView::default());
    let (shutdown_tx, shutdown) = watch::channel(false);
    let mut poller = tokio::spawn(run_player(
        sync.clone(),
        config.poll_interval(),
        updates,
        shutdown,
    ));

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        tokio::select! {
            stopped = &mut poller => {
                match stopped.context("poller task failed")? {
                    Stopped::Completed => println!("session completed"),
                    Stopped::Shutdown => {}
                }
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&views.borrow_and_update());
            }
            line = lines.next_line() => {
                if line.context("reading stdin")?.is_none() {
                    break;
                }
                match sync.lock().await.press().await {
                    Ok(PressOutcome::Recorded { position }) => println!("tapped! position #{position}"),
                    Ok(PressOutcome::AlreadyTapped { position }) => {
                        println!("already tapped this round (#{position})")
                    }
                    Err(err) => warn!(error = %err, "tap failed"),
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}
