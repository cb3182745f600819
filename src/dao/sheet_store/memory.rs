//! In-process spreadsheet used for local play and tests.

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    models::Sheet,
    sheet_store::{Row, SheetStore},
    storage::{StorageError, StorageResult},
};

/// Sheets kept in memory; cloning shares the same underlying data.
#[derive(Clone, Default)]
pub struct MemorySheetStore {
    sheets: Arc<RwLock<HashMap<Sheet, Vec<Row>>>>,
    offline: Arc<AtomicBool>,
}

impl MemorySheetStore {
    /// Create a store with every sheet already present.
    pub async fn new() -> Self {
        let store = Self::default();
        {
            let mut sheets = store.sheets.write().await;
            for sheet in Sheet::ALL {
                sheets.insert(sheet, Vec::new());
            }
        }
        store
    }

    /// Simulate an outage: every call fails until switched back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory store offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "offline"),
            ))
        } else {
            Ok(())
        }
    }
}

impl SheetStore for MemorySheetStore {
    fn ensure_sheet(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            store.sheets.write().await.entry(sheet).or_default();
            Ok(())
        })
    }

    fn read_rows(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let sheets = store.sheets.read().await;
            sheets
                .get(&sheet)
                .cloned()
                .ok_or_else(|| StorageError::UnknownSheet {
                    sheet: sheet.to_string(),
                })
        })
    }

    fn append_row(&self, sheet: Sheet, row: Row) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut sheets = store.sheets.write().await;
            let rows = sheets
                .get_mut(&sheet)
                .ok_or_else(|| StorageError::UnknownSheet {
                    sheet: sheet.to_string(),
                })?;
            rows.push(row);
            Ok(())
        })
    }

    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        column: usize,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut sheets = store.sheets.write().await;
            let rows = sheets
                .get_mut(&sheet)
                .ok_or_else(|| StorageError::UnknownSheet {
                    sheet: sheet.to_string(),
                })?;
            let target = rows.get_mut(row).ok_or_else(|| StorageError::RowOutOfRange {
                sheet: sheet.to_string(),
                row,
            })?;
            if target.len() <= column {
                target.resize(column + 1, String::new());
            }
            target[column] = value;
            Ok(())
        })
    }

    fn delete_rows(&self, sheet: Sheet, mut rows: Vec<usize>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut sheets = store.sheets.write().await;
            let data = sheets
                .get_mut(&sheet)
                .ok_or_else(|| StorageError::UnknownSheet {
                    sheet: sheet.to_string(),
                })?;
            rows.sort_unstable();
            rows.dedup();
            for index in rows.into_iter().rev() {
                if index < data.len() {
                    data.remove(index);
                }
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}
