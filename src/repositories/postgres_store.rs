//! Backend PostgreSQL
//!
//! Cada `FleetTransaction` envuelve una `sqlx::Transaction`; los métodos
//! `lock_*` usan `SELECT ... FOR UPDATE` para serializar operaciones que
//! tocan el mismo vehículo o conductor.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    Driver, DriverFilters, FuelLog, MaintenanceRecord, Trip, TripFilters, TripStatus, Vehicle,
    VehicleFilters,
};
use crate::repositories::store::{FleetStore, FleetTransaction};
use crate::utils::errors::{AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";

/// Convierte violaciones de unicidad en conflictos; el resto queda como error de base de datos
fn map_write_error(e: sqlx::Error, what: &str) -> AppError {
    let is_unique = e
        .as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION);
    if is_unique {
        AppError::Conflict(format!("{} violates a uniqueness constraint", what))
    } else {
        AppError::Database(e)
    }
}

fn expect_one_row(rows_affected: u64, what: &str, id: Uuid) -> AppResult<()> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(AppError::Internal(format!("{} {} vanished during update", what, id)))
    }
}

fn status_names(statuses: &[TripStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn FleetTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.is_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn find_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE ($1::driver_status IS NULL OR status = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.is_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE ($1::trip_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::uuid IS NULL OR driver_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceRecord>> {
        let record = sqlx::query_as::<_, MaintenanceRecord>("SELECT * FROM maintenance_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_maintenance(&self, vehicle_id: Option<Uuid>) -> AppResult<Vec<MaintenanceRecord>> {
        let records = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT * FROM maintenance_records
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_fuel_logs(&self, vehicle_id: Uuid) -> AppResult<Vec<FuelLog>> {
        let logs = sqlx::query_as::<_, FuelLog>(
            "SELECT * FROM fuel_logs WHERE vehicle_id = $1 ORDER BY filled_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl FleetTransaction for PgTransaction {
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(vehicle)
    }

    async fn lock_driver(&mut self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(driver)
    }

    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(trip)
    }

    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<MaintenanceRecord>> {
        let record = sqlx::query_as::<_, MaintenanceRecord>(
            "SELECT * FROM maintenance_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(record)
    }

    async fn license_plate_taken(&mut self, plate: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE license_plate = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(plate)
        .bind(exclude)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(result.0)
    }

    async fn license_number_taken(&mut self, number: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE license_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(number)
        .bind(exclude)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(result.0)
    }

    async fn count_vehicle_trips(&mut self, vehicle_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM trips WHERE vehicle_id = $1 AND status::text = ANY($2)",
        )
        .bind(vehicle_id)
        .bind(status_names(statuses))
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(result.0)
    }

    async fn count_driver_trips(&mut self, driver_id: Uuid, statuses: &[TripStatus]) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM trips WHERE driver_id = $1 AND status::text = ANY($2)",
        )
        .bind(driver_id)
        .bind(status_names(statuses))
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(result.0)
    }

    async fn count_active_maintenance(&mut self, vehicle_id: Uuid, exclude: Option<Uuid>) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM maintenance_records
            WHERE vehicle_id = $1
              AND status IN ('scheduled', 'in_progress')
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(vehicle_id)
        .bind(exclude)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(result.0)
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, license_plate, name, model, year, fuel_type, max_load_capacity,
                                  odometer, status, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.name)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.fuel_type)
        .bind(vehicle.max_load_capacity)
        .bind(vehicle.odometer)
        .bind(vehicle.status)
        .bind(vehicle.is_active)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "vehicle"))?;
        Ok(())
    }

    async fn update_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET license_plate = $2, name = $3, model = $4, year = $5, fuel_type = $6,
                max_load_capacity = $7, odometer = $8, status = $9, is_active = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.name)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.fuel_type)
        .bind(vehicle.max_load_capacity)
        .bind(vehicle.odometer)
        .bind(vehicle.status)
        .bind(vehicle.is_active)
        .bind(vehicle.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "vehicle"))?;
        expect_one_row(result.rows_affected(), "vehicle", vehicle.id)
    }

    async fn insert_driver(&mut self, driver: &Driver) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, full_name, phone, email, license_number, license_category,
                                 license_expiry_date, status, safety_score, total_trips, completed_trips,
                                 is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(driver.id)
        .bind(&driver.full_name)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.license_number)
        .bind(&driver.license_category)
        .bind(driver.license_expiry_date)
        .bind(driver.status)
        .bind(driver.safety_score)
        .bind(driver.total_trips)
        .bind(driver.completed_trips)
        .bind(driver.is_active)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "driver"))?;
        Ok(())
    }

    async fn update_driver(&mut self, driver: &Driver) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET full_name = $2, phone = $3, email = $4, license_number = $5, license_category = $6,
                license_expiry_date = $7, status = $8, safety_score = $9, total_trips = $10,
                completed_trips = $11, is_active = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(driver.id)
        .bind(&driver.full_name)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.license_number)
        .bind(&driver.license_category)
        .bind(driver.license_expiry_date)
        .bind(driver.status)
        .bind(driver.safety_score)
        .bind(driver.total_trips)
        .bind(driver.completed_trips)
        .bind(driver.is_active)
        .bind(driver.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "driver"))?;
        expect_one_row(result.rows_affected(), "driver", driver.id)
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, vehicle_id, driver_id, cargo_weight, origin, destination, revenue, status,
                               start_odometer, end_odometer, distance, created_by, dispatched_at, completed_at,
                               cancelled_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(trip.id)
        .bind(trip.vehicle_id)
        .bind(trip.driver_id)
        .bind(trip.cargo_weight)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.revenue)
        .bind(trip.status)
        .bind(trip.start_odometer)
        .bind(trip.end_odometer)
        .bind(trip.distance)
        .bind(trip.created_by)
        .bind(trip.dispatched_at)
        .bind(trip.completed_at)
        .bind(trip.cancelled_at)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "trip"))?;
        Ok(())
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET cargo_weight = $2, origin = $3, destination = $4, revenue = $5, status = $6,
                start_odometer = $7, end_odometer = $8, distance = $9, dispatched_at = $10,
                completed_at = $11, cancelled_at = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(trip.cargo_weight)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.revenue)
        .bind(trip.status)
        .bind(trip.start_odometer)
        .bind(trip.end_odometer)
        .bind(trip.distance)
        .bind(trip.dispatched_at)
        .bind(trip.completed_at)
        .bind(trip.cancelled_at)
        .bind(trip.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "trip"))?;
        expect_one_row(result.rows_affected(), "trip", trip.id)
    }

    async fn insert_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_records (id, vehicle_id, description, status, cost, scheduled_for,
                                             started_at, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.vehicle_id)
        .bind(&record.description)
        .bind(record.status)
        .bind(record.cost)
        .bind(record.scheduled_for)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_maintenance(&mut self, record: &MaintenanceRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_records
            SET description = $2, status = $3, cost = $4, scheduled_for = $5, started_at = $6,
                completed_at = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.description)
        .bind(record.status)
        .bind(record.cost)
        .bind(record.scheduled_for)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_one_row(result.rows_affected(), "maintenance record", record.id)
    }

    async fn insert_fuel_log(&mut self, log: &FuelLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fuel_logs (id, vehicle_id, trip_id, liters, cost, odometer_reading, filled_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.vehicle_id)
        .bind(log.trip_id)
        .bind(log.liters)
        .bind(log.cost)
        .bind(log.odometer_reading)
        .bind(log.filled_at)
        .bind(log.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
