//! Core data types for the CarLog record store
//!
//! This module defines the entities persisted by the store:
//! - `Vehicle`: a registered vehicle
//! - `FuelRecord`: one refueling event belonging to a vehicle
//! - `ChangeEvent`: write notification emitted after every committed mutation

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered vehicle
///
/// Owns zero or more fuel records. Deleting a vehicle deletes all of its
/// records in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    /// Unique identifier
    pub id: Uuid,
    /// Display name (e.g., "Daily driver")
    pub name: String,
    /// Manufacturer (e.g., "Toyota")
    pub manufacturer: String,
    /// Model (e.g., "Corolla")
    pub model: String,
    /// Model year
    pub year: i32,
    /// License plate
    pub license_plate: String,
    /// Vehicle identification number, if known
    #[serde(default)]
    pub vin: Option<String>,
    /// Unix timestamp in milliseconds, assigned at insertion
    pub created_at: i64,
}

impl Vehicle {
    /// Create a new vehicle with a fresh id and current timestamp
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        license_plate: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            model: model.into(),
            year,
            license_plate: license_plate.into(),
            vin: None,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Builder method: set the VIN
    pub fn vin(mut self, vin: impl Into<String>) -> Self {
        self.vin = Some(vin.into());
        self
    }
}

/// A single refueling event
///
/// `date` is the purchase date at calendar-date granularity (epoch millis at
/// midnight). `created_at` is assigned by the store at insertion, strictly
/// monotonic per store, and serves only as the tie-break of the ordering key
/// `(date, created_at)` - it is never displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Owning vehicle
    pub vehicle_id: Uuid,
    /// Purchase date, epoch milliseconds at calendar-date granularity
    pub date: i64,
    /// Insertion timestamp in milliseconds, unique per store
    pub created_at: i64,
    /// Odometer reading at refuel time (non-negative; monotonicity is not enforced)
    pub odometer: f64,
    /// Distance traveled since the previous refuel (derived or user-entered)
    pub trip: f64,
    /// Fuel volume added (positive)
    pub fuel_added: f64,
    /// Total purchase cost (non-negative)
    pub total_cost: f64,
    /// Fuel per unit distance (derived as fuel_added / trip, or a user override)
    pub fuel_economy: f64,
}

impl FuelRecord {
    /// Create a new fuel record with a fresh id
    ///
    /// `created_at` starts at zero; the store assigns the real value when the
    /// record is inserted.
    pub fn new(vehicle_id: Uuid, date: i64, odometer: f64, fuel_added: f64, total_cost: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            date,
            created_at: 0,
            odometer,
            trip: 0.0,
            fuel_added,
            total_cost,
            fuel_economy: 0.0,
        }
    }

    /// Builder method: set the trip distance
    pub fn trip(mut self, trip: f64) -> Self {
        self.trip = trip;
        self
    }

    /// Builder method: set the fuel economy
    pub fn fuel_economy(mut self, economy: f64) -> Self {
        self.fuel_economy = economy;
        self
    }
}

/// What kind of write a [`ChangeEvent`] describes
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    VehicleCreated,
    VehicleUpdated,
    VehicleDeleted,
    FuelCreated,
    FuelUpdated,
    FuelDeleted,
}

/// Notification emitted after a committed write
///
/// Every completed mutation publishes exactly one event; subscribers use it
/// to refresh derived state for the affected vehicle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChangeEvent {
    /// Vehicle whose record set changed
    pub vehicle_id: Uuid,
    /// What happened
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(vehicle_id: Uuid, kind: ChangeKind) -> Self {
        Self { vehicle_id, kind }
    }
}
