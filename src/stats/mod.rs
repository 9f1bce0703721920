//! Statistics aggregation engine
//!
//! Pure, storage-agnostic computation over snapshots of one vehicle's fuel
//! records:
//!
//! - **ordering**: the `(date, created_at)` total order and predecessor
//!   lookup used for trip auto-calculation
//! - **aggregate**: vehicle-level aggregates and per-record trip/economy
//!   derivation
//! - **engine**: read-model facade combining store snapshots with the pure
//!   computations
//! - **feed**: reactive recomputation driven by store change events
//!
//! Nothing in this module mutates its input or holds cross-call state;
//! every result is recomputed in full from the records handed in.

pub mod aggregate;
pub mod engine;
pub mod feed;
pub mod ordering;

// Re-export commonly used types
pub use aggregate::{aggregate, derive_economy, derive_trip, VehicleStats};
pub use engine::{StatsEngine, VehicleWithStats};
pub use feed::StatsFeed;
pub use ordering::{compare, predecessor_of, sort_records, OrderKey, RecordRef};
