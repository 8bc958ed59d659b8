//! Rutas de la API
//!
//! Cada recurso expone su propio router; `create_api_router` los agrupa
//! bajo `/api`.

pub mod driver_routes;
pub mod maintenance_routes;
pub mod trip_routes;
pub mod vehicle_routes;

use axum::Router;

use crate::state::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/drivers", driver_routes::create_driver_router())
        .nest("/trips", trip_routes::create_trip_router())
        .nest("/maintenance", maintenance_routes::create_maintenance_router())
}
