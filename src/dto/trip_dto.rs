use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewTrip, TripPatch};

// Request para crear un viaje en borrador
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: Decimal,
    #[validate(length(min = 1, max = 255))]
    pub origin: String,
    #[validate(length(min = 1, max = 255))]
    pub destination: String,
    #[serde(default)]
    pub revenue: Decimal,
}

impl From<CreateTripRequest> for NewTrip {
    fn from(request: CreateTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            cargo_weight: request.cargo_weight,
            origin: request.origin,
            destination: request.destination,
            revenue: request.revenue,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTripRequest {
    pub cargo_weight: Option<Decimal>,
    #[validate(length(min = 1, max = 255))]
    pub origin: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub destination: Option<String>,
    pub revenue: Option<Decimal>,
}

impl From<UpdateTripRequest> for TripPatch {
    fn from(request: UpdateTripRequest) -> Self {
        Self {
            cargo_weight: request.cargo_weight,
            origin: request.origin,
            destination: request.destination,
            revenue: request.revenue,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteTripRequest {
    pub end_odometer: Decimal,
}
