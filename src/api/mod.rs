//! CarLog REST API
//!
//! HTTP API layer for CarLog, built with Axum.
//!
//! # Endpoints
//!
//! ## Vehicles
//! - `GET /api/v1/vehicles` - List all vehicles with stats
//! - `POST /api/v1/vehicles` - Register a vehicle
//! - `GET /api/v1/vehicles/:id` - Get a vehicle with stats
//! - `PUT /api/v1/vehicles/:id` - Update a vehicle
//! - `DELETE /api/v1/vehicles/:id` - Delete a vehicle (cascades to fuels)
//!
//! ## Fuel records
//! - `GET /api/v1/vehicles/:id/fuels` - List a vehicle's records
//! - `POST /api/v1/vehicles/:id/fuels` - Log a refuel
//! - `GET /api/v1/vehicles/:id/fuels/predecessor` - Trip auto-fill lookup
//! - `PUT /api/v1/fuels/:id` - Update a record
//! - `DELETE /api/v1/fuels/:id` - Delete a record
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use carlog::api::{serve, ApiConfig, AppState};
//! use carlog::stats::StatsEngine;
//! use carlog::store::RecordStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(RecordStore::open("carlog_data/carlog.db")?);
//!     let engine = Arc::new(StatsEngine::new(Arc::clone(&store)));
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, engine, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api_routes = Router::new()
        // Vehicle routes
        .route("/vehicles", get(routes::vehicles::list_vehicles))
        .route("/vehicles", post(routes::vehicles::create_vehicle))
        .route("/vehicles/:id", get(routes::vehicles::get_vehicle))
        .route("/vehicles/:id", put(routes::vehicles::update_vehicle))
        .route("/vehicles/:id", delete(routes::vehicles::delete_vehicle))
        // Fuel record routes
        .route("/vehicles/:id/fuels", get(routes::fuels::list_fuels))
        .route("/vehicles/:id/fuels", post(routes::fuels::create_fuel))
        .route(
            "/vehicles/:id/fuels/predecessor",
            get(routes::fuels::resolve_predecessor),
        )
        .route("/fuels/:id", put(routes::fuels::update_fuel))
        .route("/fuels/:id", delete(routes::fuels::delete_fuel));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS layer from config: explicit origin list, or permissive when empty
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("CarLog API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("CarLog API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
