//! Contrato de persistencia de la flota
//!
//! Toda mutación que toca varias entidades (viaje, vehículo, conductor,
//! mantenimiento) ocurre dentro de una `FleetTransaction`. Los métodos
//! `lock_*` leen la fila y la bloquean hasta el final de la transacción;
//! `commit` aplica todas las escrituras o ninguna. Soltar la transacción sin
//! `commit` la revierte.
//!
//! Orden de bloqueo: viaje/mantenimiento → vehículo → conductor.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Driver, DriverFilters, FuelLog, MaintenanceRecord, Trip, TripFilters, TripStatus, Vehicle,
    VehicleFilters,
};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Abre una unidad de trabajo atómica
    async fn begin(&self) -> AppResult<Box<dyn FleetTransaction>>;

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;

    async fn find_driver(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>>;

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>>;

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceRecord>>;
    async fn list_maintenance(&self, vehicle_id: Option<Uuid>) -> AppResult<Vec<MaintenanceRecord>>;

    async fn list_fuel_logs(&self, vehicle_id: Uuid) -> AppResult<Vec<FuelLog>>;
}

#[async_trait]
pub trait FleetTransaction: Send {
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn lock_driver(&mut self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<MaintenanceRecord>>;

    async fn license_plate_taken(&mut self, plate: &str, exclude: Option<Uuid>) -> AppResult<bool>;
    async fn license_number_taken(&mut self, number: &str, exclude: Option<Uuid>) -> AppResult<bool>;

    async fn count_vehicle_trips(&mut self, vehicle_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64>;
    async fn count_driver_trips(&mut self, driver_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64>;

    /// Registros activos (scheduled/in_progress) del vehículo, excluyendo `exclude`
    async fn count_active_maintenance(&mut self, vehicle_id: Uuid, exclude: Option<Uuid>) -> AppResult<i64>;

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;
    async fn update_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;
    async fn insert_driver(&mut self, driver: &Driver) -> AppResult<()>;
    async fn update_driver(&mut self, driver: &Driver) -> AppResult<()>;
    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()>;
    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()>;
    async fn insert_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()>;
    async fn update_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()>;
    async fn insert_fuel_log(&mut self, log: &FuelLog) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
