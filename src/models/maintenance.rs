//! Modelo de registros de mantenimiento
//!
//! Un registro activo (scheduled o in_progress) mantiene el vehículo en
//! taller. El estado del vehículo es la única fuente de verdad sobre su
//! disponibilidad; este registro solo documenta el motivo.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub const fn allowed_transitions(self) -> &'static [MaintenanceStatus] {
        match self {
            MaintenanceStatus::Scheduled => &[
                MaintenanceStatus::InProgress,
                MaintenanceStatus::Completed,
                MaintenanceStatus::Cancelled,
            ],
            MaintenanceStatus::InProgress => {
                &[MaintenanceStatus::Completed, MaintenanceStatus::Cancelled]
            }
            MaintenanceStatus::Completed | MaintenanceStatus::Cancelled => &[],
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress)
    }

    pub fn transition(self, next: MaintenanceStatus) -> AppResult<MaintenanceStatus> {
        if self.allowed_transitions().contains(&next) {
            Ok(next)
        } else {
            Err(AppError::invalid_transition("maintenance", self, next))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registro de mantenimiento - mapea a la tabla maintenance_records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub status: MaintenanceStatus,
    pub cost: Decimal,
    pub scheduled_for: NaiveDate,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub vehicle_id: Uuid,
    pub description: String,
    pub scheduled_for: NaiveDate,
    pub estimated_cost: Decimal,
}

impl MaintenanceRecord {
    pub fn new(spec: NewMaintenance) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id: spec.vehicle_id,
            description: spec.description,
            status: MaintenanceStatus::Scheduled,
            cost: spec.estimated_cost,
            scheduled_for: spec.scheduled_for,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_transitions() {
        use MaintenanceStatus::*;
        assert!(Scheduled.transition(InProgress).is_ok());
        assert!(Scheduled.transition(Completed).is_ok());
        assert!(InProgress.transition(Cancelled).is_ok());
        assert!(InProgress.transition(Scheduled).is_err());
        assert!(Completed.transition(Cancelled).is_err());
        assert!(Cancelled.transition(InProgress).is_err());
    }

    #[test]
    fn test_active_states() {
        assert!(MaintenanceStatus::Scheduled.is_active());
        assert!(MaintenanceStatus::InProgress.is_active());
        assert!(!MaintenanceStatus::Completed.is_active());
        assert!(!MaintenanceStatus::Cancelled.is_active());
    }
}
