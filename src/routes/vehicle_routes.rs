use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{
    CreateFuelLogRequest, CreateVehicleRequest, OdometerRequest, ServiceStateRequest, UpdateVehicleRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::{AuthenticatedActor, DISPATCH_ROLES, REGISTRY_ROLES};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{FuelLog, Vehicle, VehicleFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .route("/:id/odometer", put(update_odometer))
        .route("/:id/service-state", put(update_service_state))
        .route("/:id/fuel-logs", get(list_fuel_logs).post(record_fuel))
}

async fn create_vehicle(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.create(request).await?))
}

async fn list_vehicles(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<VehicleFilters>,
) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.list(filters).await?))
}

async fn get_vehicle(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_vehicle(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_vehicle(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.delete(id).await?))
}

async fn update_odometer(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<OdometerRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.apply_odometer(id, request.odometer).await?))
}

async fn update_service_state(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ServiceStateRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.set_service_state(id, request.status).await?))
}

async fn record_fuel(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateFuelLogRequest>,
) -> Result<Json<ApiResponse<FuelLog>>, AppError> {
    actor.require_role(DISPATCH_ROLES)?;
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.record_fuel(id, request).await?))
}

async fn list_fuel_logs(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<FuelLog>>>, AppError> {
    let controller = VehicleController::new(state.store.clone());
    Ok(Json(controller.fuel_logs(id).await?))
}
