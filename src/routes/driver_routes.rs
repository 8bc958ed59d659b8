use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{CreateDriverRequest, DutyStatusRequest, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::{AuthenticatedActor, REGISTRY_ROLES};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Driver, DriverFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/:id", get(get_driver).put(update_driver).delete(delete_driver))
        .route("/:id/status", put(update_duty_status))
}

async fn create_driver(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.create(request).await?))
}

async fn list_drivers(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<DriverFilters>,
) -> Result<Json<ApiResponse<Vec<Driver>>>, AppError> {
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.list(filters).await?))
}

async fn get_driver(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_driver(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_driver(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.delete(id).await?))
}

async fn update_duty_status(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<DutyStatusRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = DriverController::new(state.store.clone());
    Ok(Json(controller.set_duty_status(id, request.status).await?))
}
