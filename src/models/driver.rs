//! Modelo de Driver
//!
//! Conductores, su estado de servicio y el predicado de asignabilidad que
//! el motor de viajes evalúa antes de despachar.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Estado del conductor - mapea al ENUM driver_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    OnDuty,
    OffDuty,
    OnTrip,
    Suspended,
    OnLeave,
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::OnDuty => "on_duty",
            DriverStatus::OffDuty => "off_duty",
            DriverStatus::OnTrip => "on_trip",
            DriverStatus::Suspended => "suspended",
            DriverStatus::OnLeave => "on_leave",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Motivo por el que un conductor no puede ser asignado a un viaje
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DisqualificationReason {
    LicenseExpired { expired_on: NaiveDate },
    Suspended,
    Inactive,
}

impl fmt::Display for DisqualificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisqualificationReason::LicenseExpired { expired_on } => {
                write!(f, "license expired on {}", expired_on)
            }
            DisqualificationReason::Suspended => f.write_str("driver is suspended"),
            DisqualificationReason::Inactive => f.write_str("driver has been deactivated"),
        }
    }
}

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub license_number: String,
    pub license_category: String,
    pub license_expiry_date: NaiveDate,
    pub status: DriverStatus,
    pub safety_score: i32,
    pub total_trips: i32,
    pub completed_trips: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDriver {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub license_number: String,
    pub license_category: String,
    pub license_expiry_date: NaiveDate,
    pub safety_score: i32,
}

#[derive(Debug, Clone, Default)]
pub struct DriverPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub license_number: Option<String>,
    pub license_category: Option<String>,
    pub license_expiry_date: Option<NaiveDate>,
    pub safety_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverFilters {
    pub status: Option<DriverStatus>,
    pub is_active: Option<bool>,
}

impl Driver {
    pub fn new(spec: NewDriver) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: spec.full_name,
            phone: spec.phone,
            email: spec.email,
            license_number: spec.license_number,
            license_category: spec.license_category,
            license_expiry_date: spec.license_expiry_date,
            status: DriverStatus::OnDuty,
            safety_score: spec.safety_score,
            total_trips: 0,
            completed_trips: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn license_valid_on(&self, today: NaiveDate) -> bool {
        self.license_expiry_date > today
    }

    /// Predicado puro: activo, en servicio y con licencia vigente.
    pub fn is_assignable(&self, today: NaiveDate) -> bool {
        self.is_active && self.status == DriverStatus::OnDuty && self.license_valid_on(today)
    }

    /// Motivo de descalificación, si existe. Un conductor fuera de servicio
    /// o ya en viaje no está descalificado, solo no disponible.
    pub fn disqualification(&self, today: NaiveDate) -> Option<DisqualificationReason> {
        if !self.is_active {
            Some(DisqualificationReason::Inactive)
        } else if self.status == DriverStatus::Suspended {
            Some(DisqualificationReason::Suspended)
        } else if !self.license_valid_on(today) {
            Some(DisqualificationReason::LicenseExpired {
                expired_on: self.license_expiry_date,
            })
        } else {
            None
        }
    }

    pub fn update_status(&mut self, new_status: DriverStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn increment_total_trips(&mut self, delta: i32) -> AppResult<()> {
        self.total_trips = adjust_counter("total_trips", self.total_trips, delta)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn increment_completed_trips(&mut self, delta: i32) -> AppResult<()> {
        self.completed_trips = adjust_counter("completed_trips", self.completed_trips, delta)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn adjust_counter(name: &str, current: i32, delta: i32) -> AppResult<i32> {
    match current.checked_add(delta) {
        Some(value) if value >= 0 => Ok(value),
        _ => Err(AppError::InvariantViolation(format!(
            "{} cannot move from {} by {}",
            name, current, delta
        ))),
    }
}
