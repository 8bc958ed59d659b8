use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::models::{Driver, DriverFilters, DriverStatus};
use crate::repositories::FleetStore;
use crate::services::DriverRegistry;
use crate::utils::errors::AppError;

pub struct DriverController {
    registry: DriverRegistry,
}

impl DriverController {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self {
            registry: DriverRegistry::new(store),
        }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> Result<ApiResponse<Driver>, AppError> {
        request.validate()?;
        let driver = self.registry.create(request.into()).await?;
        Ok(ApiResponse::success_with_message(driver, "Conductor registrado exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<Driver>, AppError> {
        Ok(ApiResponse::success(self.registry.get(id).await?))
    }

    pub async fn list(&self, filters: DriverFilters) -> Result<ApiResponse<Vec<Driver>>, AppError> {
        Ok(ApiResponse::success(self.registry.list(&filters).await?))
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> Result<ApiResponse<Driver>, AppError> {
        request.validate()?;
        let driver = self.registry.update(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(driver, "Conductor actualizado exitosamente"))
    }

    pub async fn set_duty_status(&self, id: Uuid, status: DriverStatus) -> Result<ApiResponse<Driver>, AppError> {
        Ok(ApiResponse::success(self.registry.set_duty_status(id, status).await?))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<Driver>, AppError> {
        let driver = self.registry.soft_delete(id).await?;
        Ok(ApiResponse::success_with_message(driver, "Conductor dado de baja"))
    }
}
