//! CarLog record store
//!
//! Keyed persistence for vehicles and fuel records:
//!
//! - **types**: domain entities (`Vehicle`, `FuelRecord`) and change events
//! - **db**: SQLite-backed `RecordStore` with cascade delete and write
//!   notifications
//! - **error**: error types
//!
//! The store serializes writes and guarantees that a vehicle delete and the
//! delete of its fuel records commit atomically. Derived statistics live in
//! [`crate::stats`], computed from snapshots read here.

pub mod db;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use db::RecordStore;
pub use error::{StoreError, StoreResult};
pub use types::{ChangeEvent, ChangeKind, FuelRecord, Vehicle};
