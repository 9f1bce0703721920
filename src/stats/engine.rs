//! Stats engine
//!
//! Read-side facade over the record store. Every call takes a fresh snapshot
//! of the vehicle's records and computes derived state from scratch; the
//! engine holds no mutable state of its own, so concurrent calls from
//! multiple readers need no synchronization beyond the store's.

use crate::stats::aggregate::{aggregate, VehicleStats};
use crate::stats::ordering::{predecessor_of, sort_records, RecordRef};
use crate::store::{FuelRecord, RecordStore, StoreError, StoreResult, Vehicle};
use std::sync::Arc;
use uuid::Uuid;

/// A vehicle bundled with its derived statistics
///
/// Materialized on every read; never stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VehicleWithStats {
    pub vehicle: Vehicle,
    pub stats: VehicleStats,
}

/// Computes read models from record snapshots
pub struct StatsEngine {
    store: Arc<RecordStore>,
}

impl StatsEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Stats for one vehicle
    ///
    /// A vehicle with no records gets zeroed stats; a missing vehicle is
    /// `VehicleNotFound`, never zeroed stats.
    pub fn compute_stats(&self, vehicle_id: Uuid) -> StoreResult<VehicleWithStats> {
        let vehicle = self
            .store
            .get_vehicle(vehicle_id)?
            .ok_or(StoreError::VehicleNotFound(vehicle_id))?;

        let records = self.store.list_fuels(vehicle_id)?;
        Ok(VehicleWithStats {
            stats: aggregate(&records),
            vehicle,
        })
    }

    /// Stats for every vehicle, ordered by vehicle creation time descending
    pub fn compute_stats_for_all(&self) -> StoreResult<Vec<VehicleWithStats>> {
        self.store
            .list_vehicles()?
            .into_iter()
            .map(|vehicle| {
                let records = self.store.list_fuels(vehicle.id)?;
                Ok(VehicleWithStats {
                    stats: aggregate(&records),
                    vehicle,
                })
            })
            .collect()
    }

    /// The record immediately preceding `reference` in the vehicle's ordering
    ///
    /// Used for trip auto-fill during record entry and edit. `None` is the
    /// defined "no predecessor" outcome, not an error.
    pub fn resolve_predecessor(
        &self,
        vehicle_id: Uuid,
        reference: RecordRef,
    ) -> StoreResult<Option<FuelRecord>> {
        let records = self.store.list_fuels(vehicle_id)?;
        Ok(predecessor_of(&records, &reference).cloned())
    }

    /// A vehicle's records in the `(date, created_at)` total order, oldest first
    pub fn records_in_order(&self, vehicle_id: Uuid) -> StoreResult<Vec<FuelRecord>> {
        let mut records = self.store.list_fuels(vehicle_id)?;
        sort_records(&mut records);
        Ok(records)
    }
}
