//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use crate::stats::VehicleWithStats;
use crate::store::FuelRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================
// VEHICLE DTOs
// ============================================

/// Create vehicle request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVehicleRequest {
    /// Display name
    pub name: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Model
    pub model: String,
    /// Model year
    pub year: i32,
    /// License plate
    pub license_plate: String,
    /// Optional VIN
    #[serde(default)]
    pub vin: Option<String>,
}

/// Update vehicle request (full replacement of editable fields)
pub type UpdateVehicleRequest = CreateVehicleRequest;

/// Vehicle list response
#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    /// Number of vehicles
    pub total: usize,
    /// Vehicles with stats, newest first
    pub vehicles: Vec<VehicleWithStats>,
}

// ============================================
// FUEL RECORD DTOs
// ============================================

/// Create fuel record request
///
/// When `trip` is omitted it is auto-derived from the predecessor record;
/// if that is not computable the request is rejected and the caller must
/// supply the trip manually. `fuel_economy` omitted means "derive from
/// fuel_added / trip".
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFuelRequest {
    /// Purchase date, epoch milliseconds at calendar-date granularity
    pub date: i64,
    /// Odometer reading
    pub odometer: f64,
    /// Trip distance; omit to auto-derive
    #[serde(default)]
    pub trip: Option<f64>,
    /// Fuel volume added
    pub fuel_added: f64,
    /// Total purchase cost
    pub total_cost: f64,
    /// Fuel economy override; omit to derive
    #[serde(default)]
    pub fuel_economy: Option<f64>,
}

/// Update fuel record request
///
/// A provided `trip` always wins (manual entries are never overwritten).
/// With `trip` omitted: `auto_trip = true` re-derives from the predecessor
/// under the updated ordering key, `auto_trip = false` keeps the stored trip.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFuelRequest {
    /// Purchase date, epoch milliseconds at calendar-date granularity
    pub date: i64,
    /// Odometer reading
    pub odometer: f64,
    /// Trip distance; omit to keep or re-derive (see `auto_trip`)
    #[serde(default)]
    pub trip: Option<f64>,
    /// Fuel volume added
    pub fuel_added: f64,
    /// Total purchase cost
    pub total_cost: f64,
    /// Fuel economy override; omit to derive
    #[serde(default)]
    pub fuel_economy: Option<f64>,
    /// Re-derive the trip from the (possibly moved) predecessor
    #[serde(default)]
    pub auto_trip: bool,
}

/// Fuel record list response
#[derive(Debug, Serialize)]
pub struct FuelListResponse {
    /// Owning vehicle
    pub vehicle_id: Uuid,
    /// Number of records
    pub total: usize,
    /// Records in display order (most recent first)
    pub fuels: Vec<FuelRecord>,
}

/// Predecessor lookup query parameters
#[derive(Debug, Deserialize)]
pub struct PredecessorQuery {
    /// Date of the reference point, epoch milliseconds
    pub date: i64,
    /// Existing record to exclude (the record being edited)
    #[serde(default)]
    pub exclude: Option<Uuid>,
    /// Candidate odometer; when present the response carries the derived trip
    #[serde(default)]
    pub odometer: Option<f64>,
}

/// Predecessor lookup response
#[derive(Debug, Serialize)]
pub struct PredecessorResponse {
    /// The record immediately preceding the reference point, if any
    pub predecessor: Option<FuelRecord>,
    /// Trip derived from the candidate odometer; absent when not computable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<f64>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Record store status: ok or error
    pub store: String,
    /// Registered vehicle count
    pub vehicles: usize,
    /// Fuel record count across all vehicles
    pub fuel_records: i64,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
}
