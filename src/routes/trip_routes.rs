use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest, UpdateTripRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::{AuthenticatedActor, CANCEL_ROLES, DISPATCH_ROLES};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Trip, TripFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip).put(update_trip))
        .route("/:id/dispatch", post(dispatch_trip))
        .route("/:id/complete", post(complete_trip))
        .route("/:id/cancel", post(cancel_trip))
}

async fn create_trip(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTripRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    actor.require_role(DISPATCH_ROLES)?;
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.create(actor.actor_id, request).await?))
}

async fn list_trips(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<TripFilters>,
) -> Result<Json<ApiResponse<Vec<Trip>>>, AppError> {
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.list(filters).await?))
}

async fn get_trip(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_trip(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateTripRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    actor.require_role(DISPATCH_ROLES)?;
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn dispatch_trip(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    actor.require_role(DISPATCH_ROLES)?;
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.dispatch(id).await?))
}

async fn complete_trip(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CompleteTripRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    actor.require_role(DISPATCH_ROLES)?;
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.complete(id, request.end_odometer).await?))
}

async fn cancel_trip(
    actor: AuthenticatedActor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    actor.require_role(CANCEL_ROLES)?;
    let controller = TripController::new(state.store.clone());
    Ok(Json(controller.cancel(id).await?))
}
