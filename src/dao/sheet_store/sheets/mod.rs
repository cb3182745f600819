//! Google Sheets backend: the spreadsheet itself is the database.

mod auth;
mod config;
mod error;
mod models;
mod store;
#[cfg(test)]
mod tests;

pub use config::SheetsConfig;
pub use error::{SheetsDaoError, SheetsResult};
pub use store::GoogleSheetStore;

use crate::dao::storage::StorageError;

impl From<SheetsDaoError> for StorageError {
    fn from(err: SheetsDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
