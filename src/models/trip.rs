//! Modelo de Trip
//!
//! Un viaje referencia un vehículo y un conductor. Su estado sigue una
//! máquina de estados explícita:
//!
//! ```text
//! draft      -> dispatched, cancelled
//! dispatched -> completed, cancelled
//! completed  -> (none)
//! cancelled  -> (none)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 4] = [
        TripStatus::Draft,
        TripStatus::Dispatched,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    /// Tabla estática de transiciones permitidas.
    pub const fn allowed_transitions(self) -> &'static [TripStatus] {
        match self {
            TripStatus::Draft => &[TripStatus::Dispatched, TripStatus::Cancelled],
            TripStatus::Dispatched => &[TripStatus::Completed, TripStatus::Cancelled],
            TripStatus::Completed | TripStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: TripStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Un viaje en este estado retiene su vehículo y su conductor.
    pub fn holds_resources(self) -> bool {
        self == TripStatus::Dispatched
    }

    pub fn transition(self, next: TripStatus) -> AppResult<TripStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::invalid_transition("trip", self, next))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Dispatched => "dispatched",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - mapea exactamente a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: Decimal,
    pub origin: String,
    pub destination: String,
    pub revenue: Decimal,
    pub status: TripStatus,
    pub start_odometer: Option<Decimal>,
    pub end_odometer: Option<Decimal>,
    pub distance: Option<Decimal>,
    pub created_by: Uuid,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: Decimal,
    pub origin: String,
    pub destination: String,
    pub revenue: Decimal,
}

/// Campos editables mientras el viaje está en borrador
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub cargo_weight: Option<Decimal>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub revenue: Option<Decimal>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.cargo_weight.is_none()
            && self.origin.is_none()
            && self.destination.is_none()
            && self.revenue.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilters {
    pub status: Option<TripStatus>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

impl TripFilters {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.status.map_or(true, |s| trip.status == s)
            && self.vehicle_id.map_or(true, |v| trip.vehicle_id == v)
            && self.driver_id.map_or(true, |d| trip.driver_id == d)
    }
}

impl Trip {
    pub fn new(spec: NewTrip, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id: spec.vehicle_id,
            driver_id: spec.driver_id,
            cargo_weight: spec.cargo_weight,
            origin: spec.origin,
            destination: spec.destination,
            revenue: spec.revenue,
            status: TripStatus::Draft,
            start_odometer: None,
            end_odometer: None,
            distance: None,
            created_by,
            dispatched_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_is_exact() {
        use TripStatus::*;
        let allowed = [
            (Draft, Dispatched),
            (Draft, Cancelled),
            (Dispatched, Completed),
            (Dispatched, Cancelled),
        ];
        for from in TripStatus::ALL {
            for to in TripStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(TripStatus::Completed.is_terminal());
        assert!(TripStatus::Cancelled.is_terminal());
        assert!(!TripStatus::Draft.is_terminal());
        assert!(!TripStatus::Dispatched.is_terminal());
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = TripStatus::Completed.transition(TripStatus::Dispatched).unwrap_err();
        match err {
            AppError::InvalidStateTransition { entity, current, requested } => {
                assert_eq!(entity, "trip");
                assert_eq!(current, "completed");
                assert_eq!(requested, "dispatched");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_filters_match() {
        let trip = Trip::new(
            NewTrip {
                vehicle_id: Uuid::new_v4(),
                driver_id: Uuid::new_v4(),
                cargo_weight: Decimal::from(10),
                origin: "Lyon".to_string(),
                destination: "Paris".to_string(),
                revenue: Decimal::ZERO,
            },
            Uuid::new_v4(),
        );
        assert!(TripFilters::default().matches(&trip));
        let by_status = TripFilters { status: Some(TripStatus::Dispatched), ..Default::default() };
        assert!(!by_status.matches(&trip));
        let by_vehicle = TripFilters { vehicle_id: Some(trip.vehicle_id), ..Default::default() };
        assert!(by_vehicle.matches(&trip));
    }
}
