use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying spreadsheet.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("sheet `{sheet}` not found")]
    UnknownSheet { sheet: String },
    #[error("row {row} out of range in sheet `{sheet}`")]
    RowOutOfRange { sheet: String, row: usize },
    #[error("column `{column}` not found in sheet `{sheet}`")]
    UnknownColumn { sheet: String, column: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
