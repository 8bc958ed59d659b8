//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos de
//! vehículos, conductores y viajes.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::utils::errors::{field_error, AppResult};

lazy_static! {
    static ref LICENSE_PLATE_RE: Regex = Regex::new(r"^[A-Z0-9]{5,10}$").expect("valid plate regex");
    static ref LICENSE_NUMBER_RE: Regex =
        Regex::new(r"^[A-Z0-9][A-Z0-9-]{3,31}$").expect("valid license regex");
}

/// Año mínimo aceptado para un vehículo en servicio
pub const MIN_VEHICLE_YEAR: i32 = 1950;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Precisión y escala de una columna NUMERIC del esquema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericColumn {
    pub precision: u32,
    pub scale: u32,
}

impl NumericColumn {
    /// Primer valor absoluto que ya no cabe en la columna
    pub fn limit(self) -> Decimal {
        Decimal::from(10_i64.pow(self.precision - self.scale))
    }
}

/// Pesos de carga y capacidades, NUMERIC(12, 2)
pub const WEIGHT: NumericColumn = NumericColumn { precision: 12, scale: 2 };
/// Odómetros y distancias, NUMERIC(12, 1)
pub const ODOMETER: NumericColumn = NumericColumn { precision: 12, scale: 1 };
/// Ingresos y costes de mantenimiento, NUMERIC(14, 2)
pub const MONEY: NumericColumn = NumericColumn { precision: 14, scale: 2 };
/// Litros de combustible, NUMERIC(10, 2)
pub const LITERS: NumericColumn = NumericColumn { precision: 10, scale: 2 };
/// Coste de un repostaje, NUMERIC(12, 2)
pub const FUEL_COST: NumericColumn = NumericColumn { precision: 12, scale: 2 };

/// Validar que un decimal cabe en su columna sin redondeo ni desbordamiento
pub fn validate_decimal_bounds(value: Decimal, column: NumericColumn) -> Result<(), ValidationError> {
    let limit = column.limit();
    if value.normalize().scale() > column.scale || value.abs() >= limit {
        let mut error = ValidationError::new("decimal_bounds");
        error.add_param("max_scale".into(), &column.scale);
        error.add_param("limit".into(), &limit);
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Cantidad estrictamente positiva dentro de los límites de su columna
pub fn validate_positive_quantity(value: Decimal, column: NumericColumn) -> Result<(), ValidationError> {
    validate_positive(value)?;
    validate_decimal_bounds(value, column)
}

/// Cantidad no negativa dentro de los límites de su columna
pub fn validate_non_negative_quantity(value: Decimal, column: NumericColumn) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    validate_decimal_bounds(value, column)
}

/// Normaliza una matrícula: mayúsculas, sin espacios ni guiones
pub fn normalize_license_plate(value: &str) -> String {
    value.replace([' ', '-', '_'], "").to_uppercase()
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !LICENSE_PLATE_RE.is_match(&normalize_license_plate(value)) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de número de licencia de conducir (sin distinguir mayúsculas)
pub fn validate_license_number(value: &str) -> Result<(), ValidationError> {
    if !LICENSE_NUMBER_RE.is_match(&value.trim().to_uppercase()) {
        let mut error = ValidationError::new("license_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que el año del vehículo sea plausible respecto a hoy
pub fn validate_vehicle_year(year: i32, today: NaiveDate) -> Result<(), ValidationError> {
    validate_range(year, MIN_VEHICLE_YEAR, today.year() + 1)
}

/// Atajo: valida y convierte a `AppError::Validation` con el nombre del campo
pub fn check(field: &'static str, result: Result<(), ValidationError>) -> AppResult<()> {
    result.map_err(|error| field_error(field, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10).is_ok());
        assert!(validate_range(0, 1, 10).is_err());
        assert!(validate_range(15, 1, 10).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+33 6 12 34 56 78").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_positive_decimal() {
        assert!(validate_positive(Decimal::new(1, 1)).is_ok());
        assert!(validate_positive(Decimal::ZERO).is_err());
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_decimal_bounds_follow_column() {
        assert!(validate_decimal_bounds(Decimal::new(13001, 1), ODOMETER).is_ok());
        assert!(validate_decimal_bounds(Decimal::new(130010, 2), ODOMETER).is_ok());
        assert!(validate_decimal_bounds(Decimal::new(130025, 2), ODOMETER).is_err());

        let just_below = Decimal::new(999_999_999_999, 2);
        assert!(validate_decimal_bounds(just_below, WEIGHT).is_ok());
        assert!(validate_decimal_bounds(WEIGHT.limit(), WEIGHT).is_err());
        assert!(validate_decimal_bounds(-MONEY.limit(), MONEY).is_err());

        assert!(validate_positive_quantity(Decimal::ZERO, LITERS).is_err());
        assert!(validate_positive_quantity(Decimal::new(4550, 2), LITERS).is_ok());
        assert!(validate_non_negative_quantity(Decimal::ZERO, FUEL_COST).is_ok());
        assert!(validate_non_negative_quantity(Decimal::new(1, 3), FUEL_COST).is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("AB-123-CD").is_ok());
        assert!(validate_license_plate("ab 123 cd").is_ok());
        assert!(validate_license_plate("A").is_err());
        assert!(validate_license_plate("ABCDEFGHIJK").is_err());
        assert_eq!(normalize_license_plate("ab-123 cd"), "AB123CD");
    }

    #[test]
    fn test_validate_license_number() {
        assert!(validate_license_number("DL-100200").is_ok());
        assert!(validate_license_number("").is_err());
        assert!(validate_license_number("-BAD").is_err());
    }

    #[test]
    fn test_validate_vehicle_year() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(validate_vehicle_year(2027, today).is_ok());
        assert!(validate_vehicle_year(2028, today).is_err());
        assert!(validate_vehicle_year(1900, today).is_err());
    }

    #[test]
    fn test_check_wraps_field() {
        let err = check("origin", validate_not_empty("  ")).unwrap_err();
        assert!(err.to_string().contains("origin"));
    }
}
