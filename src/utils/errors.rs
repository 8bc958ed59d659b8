//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::DisqualificationReason;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid {entity} transition: {current} -> {requested}")]
    InvalidStateTransition {
        entity: &'static str,
        current: String,
        requested: String,
    },

    #[error("Cargo weight {cargo_weight} kg exceeds vehicle capacity {max_load_capacity} kg")]
    CapacityExceeded {
        cargo_weight: Decimal,
        max_load_capacity: Decimal,
    },

    #[error("{resource} {id} is unavailable (status: {status})")]
    ResourceUnavailable {
        resource: &'static str,
        id: Uuid,
        status: String,
    },

    #[error("Driver {driver_id} is not qualified: {reason}")]
    DriverUnqualified {
        driver_id: Uuid,
        reason: DisqualificationReason,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_transition(entity: &'static str, current: impl Display, requested: impl Display) -> Self {
        AppError::InvalidStateTransition {
            entity,
            current: current.to_string(),
            requested: requested.to_string(),
        }
    }

    pub fn unavailable(resource: &'static str, id: Uuid, status: impl Display) -> Self {
        AppError::ResourceUnavailable {
            resource,
            id,
            status: status.to_string(),
        }
    }

    /// Código estable para la capa que renderiza el error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::ResourceUnavailable { .. } => "RESOURCE_UNAVAILABLE",
            AppError::DriverUnqualified { .. } => "DRIVER_UNQUALIFIED",
            AppError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::CapacityExceeded { .. }
            | AppError::InvariantViolation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidStateTransition { .. }
            | AppError::ResourceUnavailable { .. }
            | AppError::DriverUnqualified { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        if status.is_server_error() {
            log::error!("❌ {}", self);
        } else {
            log::warn!("⚠️ {}", self);
        }

        let (message, details) = match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                ("An unexpected error occurred".to_string(), None)
            }
            AppError::Validation(errors) => (
                "The provided data is invalid".to_string(),
                Some(json!(errors)),
            ),
            AppError::InvalidStateTransition { entity, current, requested } => (
                self.to_string(),
                Some(json!({ "entity": entity, "current": current, "requested": requested })),
            ),
            AppError::CapacityExceeded { cargo_weight, max_load_capacity } => (
                self.to_string(),
                Some(json!({
                    "cargo_weight": cargo_weight,
                    "max_load_capacity": max_load_capacity,
                })),
            ),
            AppError::ResourceUnavailable { resource, id, status } => (
                self.to_string(),
                Some(json!({ "resource": resource, "id": id, "status": status })),
            ),
            AppError::DriverUnqualified { driver_id, reason } => (
                self.to_string(),
                Some(json!({ "driver_id": driver_id, "cause": reason })),
            ),
            AppError::InvariantViolation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => (msg.clone(), None),
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación de un campo
pub fn field_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

/// Función helper para crear errores de validación con mensaje
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    let mut error = validator::ValidationError::new("custom");
    error.message = Some(message.into());
    field_error(field, error)
}

/// Error de validación para una entrada que axum no pudo decodificar
fn rejection_error(field: &'static str, message: String) -> AppError {
    let mut error = validator::ValidationError::new("malformed");
    error.message = Some(message.into());
    field_error(field, error)
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejection_error("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        rejection_error("path", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        rejection_error("query", rejection.body_text())
    }
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto por duplicado
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}
