//! Record store error types

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Requested vehicle does not exist
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(Uuid),

    /// Requested fuel record does not exist
    #[error("Fuel record not found: {0}")]
    FuelRecordNotFound(Uuid),

    /// Underlying SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed (e.g., creating the data directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
