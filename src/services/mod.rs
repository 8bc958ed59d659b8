//! Services module
//!
//! Lógica de negocio de la flota: registros de vehículos y conductores,
//! motor de ciclo de vida de viajes y bloqueo de mantenimiento. Todos
//! trabajan sobre un `FleetStore` compartido.

pub mod driver_registry;
pub mod maintenance_lock;
pub mod trip_engine;
pub mod vehicle_registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use driver_registry::DriverRegistry;
pub use maintenance_lock::MaintenanceLock;
pub use trip_engine::TripEngine;
pub use vehicle_registry::VehicleRegistry;
