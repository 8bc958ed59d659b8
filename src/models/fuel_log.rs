//! Modelo de FuelLog
//!
//! Gastos de combustible por vehículo. Solo lectura para analítica.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FuelLog {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub liters: Decimal,
    pub cost: Decimal,
    pub odometer_reading: Option<Decimal>,
    pub filled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFuelLog {
    pub vehicle_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub liters: Decimal,
    pub cost: Decimal,
    pub odometer_reading: Option<Decimal>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl FuelLog {
    pub fn new(spec: NewFuelLog) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id: spec.vehicle_id,
            trip_id: spec.trip_id,
            liters: spec.liters,
            cost: spec.cost,
            odometer_reading: spec.odometer_reading,
            filled_at: spec.filled_at.unwrap_or(now),
            created_at: now,
        }
    }
}
