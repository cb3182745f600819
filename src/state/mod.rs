use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{repository::Repository, sheet_store::SheetStore},
    error::ServiceError,
};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Central application state: the spreadsheet handle, degraded flag and write gate.
pub struct AppState {
    sheet_store: RwLock<Option<Arc<dyn SheetStore>>>,
    degraded: watch::Sender<bool>,
    write_gate: Mutex<()>,
    write_timeout: Option<Duration>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            sheet_store: RwLock::new(None),
            degraded: degraded_tx,
            write_gate: Mutex::new(()),
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current sheet store, if one is installed.
    pub async fn sheet_store(&self) -> Option<Arc<dyn SheetStore>> {
        let guard = self.sheet_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current sheet store, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_sheet_store(&self) -> Result<Arc<dyn SheetStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.sheet_store().await.ok_or(ServiceError::Degraded)
    }

    /// Typed repository over the current store.
    pub async fn repository(&self) -> Result<Repository, ServiceError> {
        self.require_sheet_store().await.map(Repository::new)
    }

    /// Install a new sheet store implementation and leave degraded mode.
    pub async fn set_sheet_store(&self, store: Arc<dyn SheetStore>) {
        {
            let mut guard = self.sheet_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Run a read-modify-write sequence against the spreadsheet while no other
    /// write of this process is in flight.
    pub async fn run_write<F, Fut, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(Repository) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let repository = self.repository().await?;
        let _gate = self.write_gate.lock().await;

        match self.write_timeout {
            Some(limit) => match timeout(limit, work(repository)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?limit, "spreadsheet write timed out");
                    Err(ServiceError::Timeout)
                }
            },
            None => work(repository).await,
        }
    }
}
