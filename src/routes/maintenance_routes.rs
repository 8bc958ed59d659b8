use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::maintenance_dto::{CompleteMaintenanceRequest, MaintenanceQuery, ScheduleMaintenanceRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::{AuthenticatedActor, REGISTRY_ROLES};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::MaintenanceRecord;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_maintenance).post(schedule_maintenance))
        .route("/:id", get(get_maintenance))
        .route("/:id/start", post(start_maintenance))
        .route("/:id/complete", post(complete_maintenance))
        .route("/:id/cancel", post(cancel_maintenance))
}

async fn schedule_maintenance(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ScheduleMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.schedule(request).await?))
}

async fn list_maintenance(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MaintenanceQuery>,
) -> Result<Json<ApiResponse<Vec<MaintenanceRecord>>>, AppError> {
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.list(query.vehicle_id).await?))
}

async fn get_maintenance(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn start_maintenance(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.start(id).await?))
}

async fn complete_maintenance(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CompleteMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.complete(id, request.cost).await?))
}

async fn cancel_maintenance(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    actor.require_role(REGISTRY_ROLES)?;
    let controller = MaintenanceController::new(state.store.clone());
    Ok(Json(controller.cancel(id).await?))
}
