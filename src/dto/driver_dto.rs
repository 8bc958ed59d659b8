use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::models::{DriverPatch, DriverStatus, NewDriver};

fn default_safety_score() -> i32 {
    100
}

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub license_number: String,
    #[validate(length(min = 1, max = 10))]
    pub license_category: String,
    pub license_expiry_date: NaiveDate,
    #[serde(default = "default_safety_score")]
    #[validate(range(min = 0, max = 100))]
    pub safety_score: i32,
}

impl From<CreateDriverRequest> for NewDriver {
    fn from(request: CreateDriverRequest) -> Self {
        Self {
            full_name: request.full_name,
            phone: request.phone,
            email: request.email,
            license_number: request.license_number,
            license_category: request.license_category,
            license_expiry_date: request.license_expiry_date,
            safety_score: request.safety_score,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub license_number: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub license_category: Option<String>,
    pub license_expiry_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 100))]
    pub safety_score: Option<i32>,
}

impl From<UpdateDriverRequest> for DriverPatch {
    fn from(request: UpdateDriverRequest) -> Self {
        Self {
            full_name: request.full_name,
            phone: request.phone,
            email: request.email,
            license_number: request.license_number,
            license_category: request.license_category,
            license_expiry_date: request.license_expiry_date,
            safety_score: request.safety_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DutyStatusRequest {
    pub status: DriverStatus,
}
