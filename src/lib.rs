//! # CarLog
//!
//! Personal vehicle fuel logbook - a Rust service for registering vehicles,
//! appending fuel-purchase records, and deriving per-vehicle statistics.
//!
//! ## Features
//!
//! - **Keyed record store**: embedded SQLite with atomic cascade deletes
//! - **Deterministic ordering**: records totally ordered by `(date, created_at)`
//! - **Trip auto-fill**: odometer delta against the resolved predecessor record
//! - **Live aggregates**: stats recomputed after every write, never persisted
//! - **REST API**: CRUD and read-model endpoints with Axum
//!
//! ## Modules
//!
//! - [`store`]: vehicles and fuel records, persistence and change events
//! - [`stats`]: ordering, predecessor lookup, and aggregate computation
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carlog::stats::{StatsEngine, StatsFeed};
//! use carlog::store::{FuelRecord, RecordStore, Vehicle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open the record store
//!     let store = Arc::new(RecordStore::open("carlog_data/carlog.db")?);
//!     let engine = Arc::new(StatsEngine::new(Arc::clone(&store)));
//!
//!     // Register a vehicle and log a refuel
//!     let vehicle = store.insert_vehicle(
//!         Vehicle::new("Daily driver", "Toyota", "Corolla", 2019, "AB-123-CD"),
//!     )?;
//!     store.insert_fuel(
//!         FuelRecord::new(vehicle.id, 1700000000000, 42_000.0, 11.5, 48.3).trip(310.0),
//!     )?;
//!
//!     // Read the derived statistics
//!     let with_stats = engine.compute_stats(vehicle.id)?;
//!     println!("{} refuels", with_stats.stats.refuel_count);
//!
//!     // Or subscribe to the write-refreshed read model
//!     let feed = StatsFeed::spawn(Arc::clone(&store), engine);
//!     let rx = feed.subscribe();
//!     println!("{} vehicles", rx.borrow().len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod stats;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    ChangeEvent, ChangeKind, FuelRecord, RecordStore, StoreError, StoreResult, Vehicle,
};

pub use stats::{
    aggregate, derive_economy, derive_trip, OrderKey, RecordRef, StatsEngine, StatsFeed,
    VehicleStats, VehicleWithStats,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    ApiConfig as ConfigApiConfig, Config, ConfigError, LoggingConfig,
    StoreConfig as ConfigStoreConfig,
};
