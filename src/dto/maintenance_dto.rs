use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::NewMaintenance;

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleMaintenanceRequest {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub scheduled_for: NaiveDate,
    #[serde(default)]
    pub estimated_cost: Decimal,
}

impl From<ScheduleMaintenanceRequest> for NewMaintenance {
    fn from(request: ScheduleMaintenanceRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            description: request.description,
            scheduled_for: request.scheduled_for,
            estimated_cost: request.estimated_cost,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteMaintenanceRequest {
    pub cost: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceQuery {
    pub vehicle_id: Option<Uuid>,
}
