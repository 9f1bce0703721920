//! Vehicle Routes
//!
//! CRUD endpoints for vehicles, returned together with their derived stats.
//!
//! - GET /api/v1/vehicles - List all vehicles with stats, newest first
//! - POST /api/v1/vehicles - Register a vehicle
//! - GET /api/v1/vehicles/:id - Get one vehicle with stats
//! - PUT /api/v1/vehicles/:id - Update a vehicle
//! - DELETE /api/v1/vehicles/:id - Delete a vehicle and all its fuel records

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::stats::VehicleWithStats;
use crate::store::{StoreError, Vehicle};

/// GET /api/v1/vehicles
///
/// All vehicles with their stats, ordered by creation time descending.
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<VehicleListResponse>> {
    let vehicles = state.engine.compute_stats_for_all()?;

    Ok(Json(VehicleListResponse {
        total: vehicles.len(),
        vehicles,
    }))
}

/// GET /api/v1/vehicles/:id
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VehicleWithStats>> {
    let with_stats = state.engine.compute_stats(id)?;
    Ok(Json(with_stats))
}

/// POST /api/v1/vehicles
pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVehicleRequest>,
) -> ApiResult<(StatusCode, Json<VehicleWithStats>)> {
    validate_vehicle_request(&req)?;

    let mut vehicle = Vehicle::new(
        req.name.trim(),
        req.manufacturer.trim(),
        req.model.trim(),
        req.year,
        req.license_plate.trim(),
    );
    vehicle.vin = normalized_vin(req.vin);

    let vehicle = state.store.insert_vehicle(vehicle)?;
    let with_stats = state.engine.compute_stats(vehicle.id)?;

    Ok((StatusCode::CREATED, Json(with_stats)))
}

/// PUT /api/v1/vehicles/:id
pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVehicleRequest>,
) -> ApiResult<Json<VehicleWithStats>> {
    validate_vehicle_request(&req)?;

    let mut vehicle = state
        .store
        .get_vehicle(id)?
        .ok_or(StoreError::VehicleNotFound(id))?;

    vehicle.name = req.name.trim().to_string();
    vehicle.manufacturer = req.manufacturer.trim().to_string();
    vehicle.model = req.model.trim().to_string();
    vehicle.year = req.year;
    vehicle.license_plate = req.license_plate.trim().to_string();
    vehicle.vin = normalized_vin(req.vin);

    state.store.update_vehicle(&vehicle)?;

    let with_stats = state.engine.compute_stats(id)?;
    Ok(Json(with_stats))
}

/// DELETE /api/v1/vehicles/:id
///
/// Cascade-deletes every fuel record of the vehicle in the same transaction.
pub async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_vehicle(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a create/update vehicle request
fn validate_vehicle_request(req: &CreateVehicleRequest) -> ApiResult<()> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Vehicle name cannot be empty".to_string()));
    }
    if req.manufacturer.trim().is_empty() {
        return Err(ApiError::Validation("Manufacturer cannot be empty".to_string()));
    }
    if req.model.trim().is_empty() {
        return Err(ApiError::Validation("Model cannot be empty".to_string()));
    }
    if !(1886..=2100).contains(&req.year) {
        return Err(ApiError::Validation(format!(
            "Implausible model year: {}",
            req.year
        )));
    }
    Ok(())
}

fn normalized_vin(vin: Option<String>) -> Option<String> {
    vin.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateVehicleRequest {
        CreateVehicleRequest {
            name: "Daily driver".to_string(),
            manufacturer: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2019,
            license_plate: "AB-123-CD".to_string(),
            vin: None,
        }
    }

    #[test]
    fn test_validate_vehicle_request() {
        assert!(validate_vehicle_request(&valid_request()).is_ok());

        let mut req = valid_request();
        req.name = "   ".to_string();
        assert!(validate_vehicle_request(&req).is_err());

        let mut req = valid_request();
        req.year = 1700;
        assert!(validate_vehicle_request(&req).is_err());

        let mut req = valid_request();
        req.year = 3000;
        assert!(validate_vehicle_request(&req).is_err());
    }

    #[test]
    fn test_normalized_vin() {
        assert_eq!(normalized_vin(None), None);
        assert_eq!(normalized_vin(Some("  ".to_string())), None);
        assert_eq!(
            normalized_vin(Some(" JTDBR32E720045678 ".to_string())),
            Some("JTDBR32E720045678".to_string())
        );
    }
}
