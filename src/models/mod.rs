//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de la flota.

pub mod driver;
pub mod fuel_log;
pub mod maintenance;
pub mod trip;
pub mod vehicle;

pub use driver::{DisqualificationReason, Driver, DriverFilters, DriverPatch, DriverStatus, NewDriver};
pub use fuel_log::{FuelLog, NewFuelLog};
pub use maintenance::{MaintenanceRecord, MaintenanceStatus, NewMaintenance};
pub use trip::{NewTrip, Trip, TripFilters, TripPatch, TripStatus};
pub use vehicle::{FuelType, NewVehicle, Vehicle, VehicleFilters, VehiclePatch, VehicleStatus};
