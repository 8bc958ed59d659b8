//! Controladores
//!
//! Traducen DTOs validados a llamadas de servicio y envuelven el resultado
//! en `ApiResponse`.

pub mod driver_controller;
pub mod maintenance_controller;
pub mod trip_controller;
pub mod vehicle_controller;
