//! TapBattle backend entrypoint wiring the REST API to a spreadsheet store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tapbattle_back::{
    config::AppConfig,
    dao::{sheet_store::SheetStore, storage::StorageError},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

const STORE_ENV: &str = "TAPBATTLE_STORE";
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    let backend = env::var(STORE_ENV).unwrap_or_else(|_| "memory".into());
    spawn_storage(app_state.clone(), &backend)?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the storage supervisor for the backend named by `TAPBATTLE_STORE`.
/// The API answers 503 until the first connection succeeds.
fn spawn_storage(state: SharedState, backend: &str) -> anyhow::Result<()> {
    match backend {
        #[cfg(feature = "memory-store")]
        "memory" => {
            info!("using in-memory spreadsheet store");
            tokio::spawn(storage_supervisor::run(state, || async {
                let store = tapbattle_back::dao::sheet_store::memory::MemorySheetStore::new().await;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn SheetStore>)
            }));
        }
        #[cfg(feature = "sheets-store")]
        "sheets" => {
            use tapbattle_back::dao::sheet_store::sheets::{GoogleSheetStore, SheetsConfig};

            let sheets = SheetsConfig::from_env()
                .context("reading Google Sheets configuration")?
                .with_tuning(&state.config().sheets);
            info!(spreadsheet = %sheets.spreadsheet_id, "using Google Sheets store");
            tokio::spawn(storage_supervisor::run(state, move || {
                let sheets = sheets.clone();
                async move {
                    let store = GoogleSheetStore::connect(sheets).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn SheetStore>)
                }
            }));
        }
        other => {
            warn!(backend = other, "unknown or disabled storage backend");
            bail!("unsupported {STORE_ENV} value `{other}`");
        }
    }
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
