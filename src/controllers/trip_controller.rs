use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{CreateTripRequest, UpdateTripRequest};
use crate::dto::ApiResponse;
use crate::models::{Trip, TripFilters, TripPatch};
use crate::repositories::FleetStore;
use crate::services::TripEngine;
use crate::utils::errors::{validation_error, AppError};

pub struct TripController {
    engine: TripEngine,
}

impl TripController {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self {
            engine: TripEngine::new(store),
        }
    }

    pub async fn create(&self, actor_id: Uuid, request: CreateTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;
        let trip = self.engine.create(request.into(), actor_id).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje creado en borrador"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        Ok(ApiResponse::success(self.engine.get(id).await?))
    }

    pub async fn list(&self, filters: TripFilters) -> Result<ApiResponse<Vec<Trip>>, AppError> {
        Ok(ApiResponse::success(self.engine.list(&filters).await?))
    }

    pub async fn update(&self, id: Uuid, request: UpdateTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;
        let patch: TripPatch = request.into();
        if patch.is_empty() {
            return Err(validation_error("body", "at least one field must be provided"));
        }
        let trip = self.engine.update(id, patch).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje actualizado"))
    }

    pub async fn dispatch(&self, id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.engine.dispatch(id).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje despachado"))
    }

    pub async fn complete(&self, id: Uuid, end_odometer: Decimal) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.engine.complete(id, end_odometer).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje completado"))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.engine.cancel(id).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje cancelado"))
    }
}
