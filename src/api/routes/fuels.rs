//! Fuel Record Routes
//!
//! CRUD endpoints for fuel records plus the predecessor lookup used by
//! entry/edit forms for trip auto-fill.
//!
//! - GET /api/v1/vehicles/:id/fuels - Records, most recent first
//! - POST /api/v1/vehicles/:id/fuels - Log a refuel
//! - GET /api/v1/vehicles/:id/fuels/predecessor - Resolve the predecessor of
//!   a reference point (query: date, exclude, odometer)
//! - PUT /api/v1/fuels/:id - Update a record
//! - DELETE /api/v1/fuels/:id - Delete a record

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{
    CreateFuelRequest, FuelListResponse, PredecessorQuery, PredecessorResponse, UpdateFuelRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::stats::{derive_economy, derive_trip, RecordRef};
use crate::store::{FuelRecord, StoreError};

/// GET /api/v1/vehicles/:id/fuels
///
/// Records in display order: most recent `(date, created_at)` first.
pub async fn list_fuels(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<Uuid>,
) -> ApiResult<Json<FuelListResponse>> {
    // 404 for an unknown vehicle rather than an empty list.
    state
        .store
        .get_vehicle(vehicle_id)?
        .ok_or(StoreError::VehicleNotFound(vehicle_id))?;

    let mut fuels = state.engine.records_in_order(vehicle_id)?;
    fuels.reverse();

    Ok(Json(FuelListResponse {
        vehicle_id,
        total: fuels.len(),
        fuels,
    }))
}

/// POST /api/v1/vehicles/:id/fuels
///
/// Logs a refuel. A missing `trip` is derived from the predecessor record;
/// when that is not computable the request is rejected so the caller can
/// fall back to manual entry.
pub async fn create_fuel(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<Uuid>,
    Json(req): Json<CreateFuelRequest>,
) -> ApiResult<(StatusCode, Json<FuelRecord>)> {
    validate_fuel_fields(req.date, req.odometer, req.trip, req.fuel_added, req.total_cost)?;

    state
        .store
        .get_vehicle(vehicle_id)?
        .ok_or(StoreError::VehicleNotFound(vehicle_id))?;

    let trip = match req.trip {
        Some(trip) => trip,
        None => {
            let reference = RecordRef::New { date: req.date };
            let predecessor = state.engine.resolve_predecessor(vehicle_id, reference)?;
            derive_trip(req.odometer, predecessor.as_ref()).ok_or_else(|| {
                ApiError::Validation(
                    "Trip not computable (no usable predecessor); enter it manually".to_string(),
                )
            })?
        }
    };

    let economy = resolve_economy(req.fuel_economy, req.fuel_added, trip);

    let record = state.store.insert_fuel(
        FuelRecord::new(vehicle_id, req.date, req.odometer, req.fuel_added, req.total_cost)
            .trip(trip)
            .fuel_economy(economy),
    )?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/fuels/:id
///
/// Updates a record. The predecessor is recomputed under the *updated*
/// ordering key (the edit may have moved the record within the sequence),
/// with the record itself excluded. A manually supplied trip always wins.
pub async fn update_fuel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFuelRequest>,
) -> ApiResult<Json<FuelRecord>> {
    validate_fuel_fields(req.date, req.odometer, req.trip, req.fuel_added, req.total_cost)?;

    let existing = state
        .store
        .get_fuel(id)?
        .ok_or(StoreError::FuelRecordNotFound(id))?;

    let trip = match req.trip {
        Some(trip) => trip,
        None if req.auto_trip => {
            let reference = RecordRef::Existing {
                id: existing.id,
                date: req.date,
                created_at: existing.created_at,
            };
            let predecessor = state
                .engine
                .resolve_predecessor(existing.vehicle_id, reference)?;
            derive_trip(req.odometer, predecessor.as_ref()).ok_or_else(|| {
                ApiError::Validation(
                    "Trip not computable (no usable predecessor); enter it manually".to_string(),
                )
            })?
        }
        None => existing.trip,
    };

    let economy = resolve_economy(req.fuel_economy, req.fuel_added, trip);

    let updated = FuelRecord {
        date: req.date,
        odometer: req.odometer,
        trip,
        fuel_added: req.fuel_added,
        total_cost: req.total_cost,
        fuel_economy: economy,
        ..existing
    };

    state.store.update_fuel(&updated)?;
    Ok(Json(updated))
}

/// DELETE /api/v1/fuels/:id
pub async fn delete_fuel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_fuel(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/vehicles/:id/fuels/predecessor
///
/// Trip auto-fill lookup. With `exclude` set, the reference is that existing
/// record carrying the (possibly edited) `date`; without it, the reference is
/// a new, unsaved record on `date`. With `odometer` set, the response also
/// carries the derived trip when computable.
pub async fn resolve_predecessor(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<Uuid>,
    Query(query): Query<PredecessorQuery>,
) -> ApiResult<Json<PredecessorResponse>> {
    state
        .store
        .get_vehicle(vehicle_id)?
        .ok_or(StoreError::VehicleNotFound(vehicle_id))?;

    let reference = match query.exclude {
        Some(exclude) => {
            let record = state
                .store
                .get_fuel(exclude)?
                .ok_or(StoreError::FuelRecordNotFound(exclude))?;
            RecordRef::Existing {
                id: record.id,
                date: query.date,
                created_at: record.created_at,
            }
        }
        None => RecordRef::New { date: query.date },
    };

    let predecessor = state.engine.resolve_predecessor(vehicle_id, reference)?;
    let trip = query
        .odometer
        .and_then(|odometer| derive_trip(odometer, predecessor.as_ref()));

    Ok(Json(PredecessorResponse { predecessor, trip }))
}

/// Economy: user override, else derived, else the defined zero default.
fn resolve_economy(override_value: Option<f64>, fuel_added: f64, trip: f64) -> f64 {
    if let Some(economy) = override_value {
        return economy;
    }
    derive_economy(fuel_added, trip).unwrap_or_else(|| {
        tracing::debug!(fuel_added, trip, "Economy not computable; storing zero");
        0.0
    })
}

/// Shared field validation for create and update
fn validate_fuel_fields(
    date: i64,
    odometer: f64,
    trip: Option<f64>,
    fuel_added: f64,
    total_cost: f64,
) -> ApiResult<()> {
    if date <= 0 {
        return Err(ApiError::Validation("Date must be a positive epoch timestamp".to_string()));
    }
    if !odometer.is_finite() || odometer < 0.0 {
        return Err(ApiError::Validation("Odometer must be non-negative".to_string()));
    }
    if let Some(trip) = trip {
        if !trip.is_finite() || trip < 0.0 {
            return Err(ApiError::Validation("Trip must be non-negative".to_string()));
        }
    }
    if !fuel_added.is_finite() || fuel_added <= 0.0 {
        return Err(ApiError::Validation("Fuel added must be positive".to_string()));
    }
    if !total_cost.is_finite() || total_cost < 0.0 {
        return Err(ApiError::Validation("Total cost must be non-negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fuel_fields() {
        assert!(validate_fuel_fields(1700000000000, 1000.0, Some(300.0), 11.5, 48.3).is_ok());
        assert!(validate_fuel_fields(1700000000000, 1000.0, None, 11.5, 0.0).is_ok());

        assert!(validate_fuel_fields(0, 1000.0, None, 11.5, 48.3).is_err());
        assert!(validate_fuel_fields(1700000000000, -1.0, None, 11.5, 48.3).is_err());
        assert!(validate_fuel_fields(1700000000000, 1000.0, Some(-5.0), 11.5, 48.3).is_err());
        assert!(validate_fuel_fields(1700000000000, 1000.0, None, 0.0, 48.3).is_err());
        assert!(validate_fuel_fields(1700000000000, 1000.0, None, 11.5, -0.01).is_err());
        assert!(validate_fuel_fields(1700000000000, f64::NAN, None, 11.5, 48.3).is_err());
    }

    #[test]
    fn test_resolve_economy() {
        // Override wins.
        assert_eq!(resolve_economy(Some(0.05), 12.0, 300.0), 0.05);
        // Derived from volume / trip.
        assert_eq!(resolve_economy(None, 12.0, 300.0), 0.04);
        // Not computable: defined zero default.
        assert_eq!(resolve_economy(None, 12.0, 0.0), 0.0);
    }
}
