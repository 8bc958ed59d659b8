use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateFuelLogRequest, CreateVehicleRequest, UpdateVehicleRequest};
use crate::dto::ApiResponse;
use crate::models::{FuelLog, Vehicle, VehicleFilters, VehicleStatus};
use crate::repositories::FleetStore;
use crate::services::VehicleRegistry;
use crate::utils::errors::AppError;

pub struct VehicleController {
    registry: VehicleRegistry,
}

impl VehicleController {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self {
            registry: VehicleRegistry::new(store),
        }
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self.registry.create(request.into()).await?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehículo creado exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<Vehicle>, AppError> {
        Ok(ApiResponse::success(self.registry.get(id).await?))
    }

    pub async fn list(&self, filters: VehicleFilters) -> Result<ApiResponse<Vec<Vehicle>>, AppError> {
        Ok(ApiResponse::success(self.registry.list(&filters).await?))
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self.registry.update(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehículo actualizado exitosamente"))
    }

    pub async fn apply_odometer(&self, id: Uuid, odometer: Decimal) -> Result<ApiResponse<Vehicle>, AppError> {
        Ok(ApiResponse::success(self.registry.apply_odometer(id, odometer).await?))
    }

    pub async fn set_service_state(&self, id: Uuid, status: VehicleStatus) -> Result<ApiResponse<Vehicle>, AppError> {
        Ok(ApiResponse::success(self.registry.set_service_state(id, status).await?))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<Vehicle>, AppError> {
        let vehicle = self.registry.soft_delete(id).await?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehículo dado de baja"))
    }

    pub async fn record_fuel(&self, vehicle_id: Uuid, request: CreateFuelLogRequest) -> Result<ApiResponse<FuelLog>, AppError> {
        let log = self.registry.record_fuel(request.into_new_fuel_log(vehicle_id)).await?;
        Ok(ApiResponse::success_with_message(log, "Carga de combustible registrada"))
    }

    pub async fn fuel_logs(&self, vehicle_id: Uuid) -> Result<ApiResponse<Vec<FuelLog>>, AppError> {
        Ok(ApiResponse::success(self.registry.fuel_logs(vehicle_id).await?))
    }
}
