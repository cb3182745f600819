#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
#[cfg(feature = "sheets-store")]
pub mod sheets;

use crate::dao::{models::Sheet, storage::StorageResult};
use futures::future::BoxFuture;

/// One spreadsheet row, cell values in column order.
pub type Row = Vec<String>;

/// Abstraction over the spreadsheet used as the database.
///
/// Row indices are 0-based and never include the header row.
pub trait SheetStore: Send + Sync {
    fn ensure_sheet(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<()>>;
    fn read_rows(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<Vec<Row>>>;
    fn append_row(&self, sheet: Sheet, row: Row) -> BoxFuture<'static, StorageResult<()>>;
    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        column: usize,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete the given rows; implementations remove them bottom-up so indices stay valid.
    fn delete_rows(&self, sheet: Sheet, rows: Vec<usize>) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
