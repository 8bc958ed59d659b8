use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{FuelType, NewFuelLog, NewVehicle, VehiclePatch, VehicleStatus};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub license_plate: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub model: Option<String>,
    pub year: i32,
    pub fuel_type: FuelType,
    pub max_load_capacity: Decimal,
    #[serde(default)]
    pub odometer: Decimal,
}

impl From<CreateVehicleRequest> for NewVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            license_plate: request.license_plate,
            name: request.name,
            model: request.model,
            year: request.year,
            fuel_type: request.fuel_type,
            max_load_capacity: request.max_load_capacity,
            odometer: request.odometer,
        }
    }
}

// Request para actualizar un vehículo; estado y odómetro tienen endpoints propios
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub license_plate: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub fuel_type: Option<FuelType>,
    pub max_load_capacity: Option<Decimal>,
}

impl From<UpdateVehicleRequest> for VehiclePatch {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            license_plate: request.license_plate,
            name: request.name,
            model: request.model,
            year: request.year,
            fuel_type: request.fuel_type,
            max_load_capacity: request.max_load_capacity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OdometerRequest {
    pub odometer: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ServiceStateRequest {
    pub status: VehicleStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateFuelLogRequest {
    pub trip_id: Option<Uuid>,
    pub liters: Decimal,
    pub cost: Decimal,
    pub odometer_reading: Option<Decimal>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl CreateFuelLogRequest {
    pub fn into_new_fuel_log(self, vehicle_id: Uuid) -> NewFuelLog {
        NewFuelLog {
            vehicle_id,
            trip_id: self.trip_id,
            liters: self.liters,
            cost: self.cost,
            odometer_reading: self.odometer_reading,
            filled_at: self.filled_at,
        }
    }
}
