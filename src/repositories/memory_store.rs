//! Backend en memoria
//!
//! Un único `tokio::sync::Mutex` protege todas las tablas. Cada transacción
//! retiene el mutex, trabaja sobre una copia y la publica en `commit`; así
//! las transacciones quedan serializadas y una transacción abortada no deja
//! rastro.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{
    Driver, DriverFilters, FuelLog, MaintenanceRecord, Trip, TripFilters, TripStatus, Vehicle,
    VehicleFilters,
};
use crate::repositories::store::{FleetStore, FleetTransaction};
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct FleetTables {
    vehicles: HashMap<Uuid, Vehicle>,
    drivers: HashMap<Uuid, Driver>,
    trips: HashMap<Uuid, Trip>,
    maintenance: HashMap<Uuid, MaintenanceRecord>,
    fuel_logs: Vec<FuelLog>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<FleetTables>>,
    fail_trip_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hace fallar toda escritura de viajes; sirve para comprobar rollbacks.
    pub fn fail_trip_writes(&self, fail: bool) {
        self.fail_trip_writes.store(fail, Ordering::SeqCst);
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn FleetTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            fail_trip_writes: self.fail_trip_writes.load(Ordering::SeqCst),
        }))
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .vehicles
            .values()
            .filter(|v| filters.status.map_or(true, |s| v.status == s))
            .filter(|v| filters.is_active.map_or(true, |a| v.is_active == a))
            .cloned()
            .collect();
        Ok(newest_first(rows, |v: &Vehicle| v.created_at))
    }

    async fn find_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.tables.lock().await.drivers.get(&id).cloned())
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .drivers
            .values()
            .filter(|d| filters.status.map_or(true, |s| d.status == s))
            .filter(|d| filters.is_active.map_or(true, |a| d.is_active == a))
            .cloned()
            .collect();
        Ok(newest_first(rows, |d: &Driver| d.created_at))
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.tables.lock().await.trips.get(&id).cloned())
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        let tables = self.tables.lock().await;
        let rows = tables.trips.values().filter(|t| filters.matches(t)).cloned().collect();
        Ok(newest_first(rows, |t: &Trip| t.created_at))
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceRecord>> {
        Ok(self.tables.lock().await.maintenance.get(&id).cloned())
    }

    async fn list_maintenance(&self, vehicle_id: Option<Uuid>) -> AppResult<Vec<MaintenanceRecord>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .maintenance
            .values()
            .filter(|m| vehicle_id.map_or(true, |v| m.vehicle_id == v))
            .cloned()
            .collect();
        Ok(newest_first(rows, |m: &MaintenanceRecord| m.created_at))
    }

    async fn list_fuel_logs(&self, vehicle_id: Uuid) -> AppResult<Vec<FuelLog>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .fuel_logs
            .iter()
            .filter(|f| f.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |f: &FuelLog| f.filled_at))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<FleetTables>,
    working: FleetTables,
    fail_trip_writes: bool,
}

impl MemoryTransaction {
    fn check_trip_write(&self) -> AppResult<()> {
        if self.fail_trip_writes {
            return Err(AppError::Internal("injected trip write failure".to_string()));
        }
        Ok(())
    }
}

fn upsert<T: Clone>(table: &mut HashMap<Uuid, T>, id: Uuid, row: &T, must_exist: bool) -> AppResult<()> {
    match (table.contains_key(&id), must_exist) {
        (true, false) => Err(AppError::Conflict(format!("row {} already exists", id))),
        (false, true) => Err(AppError::Internal(format!("row {} vanished during update", id))),
        _ => {
            table.insert(id, row.clone());
            Ok(())
        }
    }
}

fn count_trips<F: Fn(&Trip) -> bool>(tables: &FleetTables, statuses: &[TripStatus], owner: F) -> i64 {
    tables
        .trips
        .values()
        .filter(|t| owner(t) && statuses.contains(&t.status))
        .count() as i64
}

#[async_trait]
impl FleetTransaction for MemoryTransaction {
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.working.vehicles.get(&id).cloned())
    }

    async fn lock_driver(&mut self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.working.drivers.get(&id).cloned())
    }

    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.working.trips.get(&id).cloned())
    }

    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<MaintenanceRecord>> {
        Ok(self.working.maintenance.get(&id).cloned())
    }

    async fn license_plate_taken(&mut self, plate: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .working
            .vehicles
            .values()
            .any(|v| v.license_plate == plate && Some(v.id) != exclude))
    }

    async fn license_number_taken(&mut self, number: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .working
            .drivers
            .values()
            .any(|d| d.license_number == number && Some(d.id) != exclude))
    }

    async fn count_vehicle_trips(&mut self, vehicle_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64> {
        Ok(count_trips(&self.working, statuses, |t| t.vehicle_id == vehicle_id))
    }

    async fn count_driver_trips(&mut self, driver_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64> {
        Ok(count_trips(&self.working, statuses, |t| t.driver_id == driver_id))
    }

    async fn count_active_maintenance(&mut self, vehicle_id: Uuid, exclude: Option<Uuid>) -> AppResult<i64> {
        Ok(self
            .working
            .maintenance
            .values()
            .filter(|m| m.vehicle_id == vehicle_id && m.status.is_active() && Some(m.id) != exclude)
            .count() as i64)
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        upsert(&mut self.working.vehicles, vehicle.id, vehicle, false)
    }

    async fn update_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        upsert(&mut self.working.vehicles, vehicle.id, vehicle, true)
    }

    async fn insert_driver(&mut self, driver: &Driver) -> AppResult<()> {
        upsert(&mut self.working.drivers, driver.id, driver, false)
    }

    async fn update_driver(&mut self, driver: &Driver) -> AppResult<()> {
        upsert(&mut self.working.drivers, driver.id, driver, true)
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        self.check_trip_write()?;
        upsert(&mut self.working.trips, trip.id, trip, false)
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        self.check_trip_write()?;
        upsert(&mut self.working.trips, trip.id, trip, true)
    }

    async fn insert_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()> {
        upsert(&mut self.working.maintenance, record.id, record, false)
    }

    async fn update_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()> {
        upsert(&mut self.working.maintenance, record.id, record, true)
    }

    async fn insert_fuel_log(&mut self, log: &FuelLog) -> AppResult<()> {
        self.working.fuel_logs.push(log.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}
