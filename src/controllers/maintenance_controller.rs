use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::maintenance_dto::ScheduleMaintenanceRequest;
use crate::dto::ApiResponse;
use crate::models::MaintenanceRecord;
use crate::repositories::FleetStore;
use crate::services::MaintenanceLock;
use crate::utils::errors::AppError;

pub struct MaintenanceController {
    lock: MaintenanceLock,
}

impl MaintenanceController {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self {
            lock: MaintenanceLock::new(store),
        }
    }

    pub async fn schedule(&self, request: ScheduleMaintenanceRequest) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        request.validate()?;
        let record = self.lock.schedule(request.into()).await?;
        Ok(ApiResponse::success_with_message(record, "Mantenimiento programado; vehículo en taller"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        Ok(ApiResponse::success(self.lock.get(id).await?))
    }

    pub async fn list(&self, vehicle_id: Option<Uuid>) -> Result<ApiResponse<Vec<MaintenanceRecord>>, AppError> {
        Ok(ApiResponse::success(self.lock.list(vehicle_id).await?))
    }

    pub async fn start(&self, id: Uuid) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        Ok(ApiResponse::success(self.lock.start(id).await?))
    }

    pub async fn complete(&self, id: Uuid, cost: Decimal) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.lock.complete(id, cost).await?;
        Ok(ApiResponse::success_with_message(record, "Mantenimiento completado"))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.lock.cancel(id).await?;
        Ok(ApiResponse::success_with_message(record, "Mantenimiento cancelado"))
    }
}
