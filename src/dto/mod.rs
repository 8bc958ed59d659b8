//! DTOs de la API
//!
//! Cuerpos de petición validados con `validator` y el sobre de respuesta
//! común `ApiResponse`.

pub mod driver_dto;
pub mod maintenance_dto;
pub mod trip_dto;
pub mod vehicle_dto;

use serde::{Deserialize, Serialize};

/// Sobre de respuesta estándar
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}
