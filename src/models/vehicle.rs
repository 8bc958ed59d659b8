//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su estado de disponibilidad y las
//! primitivas puras que el registro y el motor de viajes aplican dentro de
//! una transacción. Mapea exactamente a la tabla `vehicles`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    OnTrip,
    InShop,
    OutOfService,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::InShop => "in_shop",
            VehicleStatus::OutOfService => "out_of_service",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de combustible - mapea al ENUM fuel_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "fuel_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    Petrol,
    Electric,
    Hybrid,
    Cng,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub name: String,
    pub model: Option<String>,
    pub year: i32,
    pub fuel_type: FuelType,
    pub max_load_capacity: Decimal,
    pub odometer: Decimal,
    pub status: VehicleStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos validados para registrar un vehículo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub license_plate: String,
    pub name: String,
    pub model: Option<String>,
    pub year: i32,
    pub fuel_type: FuelType,
    pub max_load_capacity: Decimal,
    pub odometer: Decimal,
}

/// Cambios parciales permitidos sobre un vehículo (nunca estado ni odómetro)
#[derive(Debug, Clone, Default)]
pub struct VehiclePatch {
    pub license_plate: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub fuel_type: Option<FuelType>,
    pub max_load_capacity: Option<Decimal>,
}

/// Filtros para listados de vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub is_active: Option<bool>,
}

impl Vehicle {
    pub fn new(spec: NewVehicle) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            license_plate: spec.license_plate,
            name: spec.name,
            model: spec.model,
            year: spec.year,
            fuel_type: spec.fuel_type,
            max_load_capacity: spec.max_load_capacity,
            odometer: spec.odometer,
            status: VehicleStatus::Available,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Primitiva de cambio de estado. El bloqueo de mantenimiento tiene
    /// precedencia: un vehículo en taller nunca pasa directamente a on_trip.
    pub fn update_status(&mut self, new_status: VehicleStatus) -> AppResult<()> {
        if new_status == VehicleStatus::OnTrip && self.status == VehicleStatus::InShop {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is in the shop and cannot go on a trip",
                self.id
            )));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Aplica una nueva lectura de odómetro; nunca retrocede.
    pub fn apply_odometer(&mut self, value: Decimal) -> AppResult<()> {
        if value < self.odometer {
            return Err(AppError::InvariantViolation(format!(
                "odometer of vehicle {} cannot decrease from {} to {}",
                self.id, self.odometer, value
            )));
        }
        self.odometer = value;
        self.updated_at = Utc::now();
        Ok(())
    }
}
