//! Registro de vehículos
//!
//! Alta, edición y baja lógica de vehículos. El estado de disponibilidad
//! lo gobiernan el motor de viajes y el bloqueo de mantenimiento; aquí solo
//! existe el interruptor manual available ↔ out_of_service.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    FuelLog, NewFuelLog, NewVehicle, TripStatus, Vehicle, VehicleFilters, VehiclePatch, VehicleStatus,
};
use crate::repositories::{FleetStore, FleetTransaction};
use crate::utils::errors::{conflict_error, not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{
    check, normalize_license_plate, validate_license_plate, validate_non_negative_quantity, validate_not_empty,
    validate_positive_quantity, validate_vehicle_year, FUEL_COST, LITERS, ODOMETER, WEIGHT,
};

pub struct VehicleRegistry {
    store: Arc<dyn FleetStore>,
}

/// Carga un vehículo bloqueado o devuelve NotFound
pub(crate) async fn lock_vehicle(tx: &mut dyn FleetTransaction, id: Uuid) -> AppResult<Vehicle> {
    tx.lock_vehicle(id)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", id))
}

fn validate_new_vehicle(spec: &NewVehicle) -> AppResult<()> {
    check("license_plate", validate_license_plate(&spec.license_plate))?;
    check("name", validate_not_empty(&spec.name))?;
    check("year", validate_vehicle_year(spec.year, Utc::now().date_naive()))?;
    check("max_load_capacity", validate_positive_quantity(spec.max_load_capacity, WEIGHT))?;
    check("odometer", validate_non_negative_quantity(spec.odometer, ODOMETER))?;
    Ok(())
}

impl VehicleRegistry {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut spec: NewVehicle) -> AppResult<Vehicle> {
        validate_new_vehicle(&spec)?;
        spec.license_plate = normalize_license_plate(&spec.license_plate);

        let mut tx = self.store.begin().await?;
        if tx.license_plate_taken(&spec.license_plate, None).await? {
            return Err(conflict_error("Vehicle", "license_plate", &spec.license_plate));
        }
        let vehicle = Vehicle::new(spec);
        tx.insert_vehicle(&vehicle).await?;
        tx.commit().await?;

        log::info!("🚚 Vehículo {} registrado ({})", vehicle.id, vehicle.license_plate);
        Ok(vehicle)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Vehicle> {
        self.store
            .find_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn list(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles(filters).await
    }

    pub async fn update(&self, id: Uuid, patch: VehiclePatch) -> AppResult<Vehicle> {
        let mut tx = self.store.begin().await?;
        let mut vehicle = lock_vehicle(tx.as_mut(), id).await?;

        if let Some(plate) = patch.license_plate {
            check("license_plate", validate_license_plate(&plate))?;
            let plate = normalize_license_plate(&plate);
            if tx.license_plate_taken(&plate, Some(id)).await? {
                return Err(conflict_error("Vehicle", "license_plate", &plate));
            }
            vehicle.license_plate = plate;
        }
        if let Some(name) = patch.name {
            check("name", validate_not_empty(&name))?;
            vehicle.name = name;
        }
        if let Some(model) = patch.model {
            vehicle.model = Some(model);
        }
        if let Some(year) = patch.year {
            check("year", validate_vehicle_year(year, Utc::now().date_naive()))?;
            vehicle.year = year;
        }
        if let Some(fuel_type) = patch.fuel_type {
            vehicle.fuel_type = fuel_type;
        }
        if let Some(capacity) = patch.max_load_capacity {
            check("max_load_capacity", validate_positive_quantity(capacity, WEIGHT))?;
            vehicle.max_load_capacity = capacity;
        }
        vehicle.updated_at = Utc::now();

        tx.update_vehicle(&vehicle).await?;
        tx.commit().await?;
        Ok(vehicle)
    }

    /// Registra una nueva lectura de odómetro fuera de un viaje.
    pub async fn apply_odometer(&self, id: Uuid, value: Decimal) -> AppResult<Vehicle> {
        check("odometer", validate_non_negative_quantity(value, ODOMETER))?;
        let mut tx = self.store.begin().await?;
        let mut vehicle = lock_vehicle(tx.as_mut(), id).await?;
        if vehicle.status == VehicleStatus::OnTrip {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is on a trip; its odometer is recorded when the trip completes",
                id
            )));
        }
        vehicle.apply_odometer(value)?;
        tx.update_vehicle(&vehicle).await?;
        tx.commit().await?;
        Ok(vehicle)
    }

    /// Interruptor manual entre available y out_of_service.
    pub async fn set_service_state(&self, id: Uuid, target: VehicleStatus) -> AppResult<Vehicle> {
        let mut tx = self.store.begin().await?;
        let mut vehicle = lock_vehicle(tx.as_mut(), id).await?;

        let allowed = matches!(
            (vehicle.status, target),
            (VehicleStatus::Available, VehicleStatus::OutOfService)
                | (VehicleStatus::OutOfService, VehicleStatus::Available)
        );
        if !allowed {
            return Err(AppError::Conflict(format!(
                "Vehicle {} cannot be moved manually from {} to {}",
                id, vehicle.status, target
            )));
        }
        vehicle.update_status(target)?;
        tx.update_vehicle(&vehicle).await?;
        tx.commit().await?;

        log::info!("🔧 Vehículo {} ahora {}", id, target);
        Ok(vehicle)
    }

    /// Baja lógica; prohibida mientras algún viaje en borrador o despachado lo referencie.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<Vehicle> {
        let mut tx = self.store.begin().await?;
        let mut vehicle = lock_vehicle(tx.as_mut(), id).await?;

        let open_trips = tx
            .count_vehicle_trips(id, &[TripStatus::Draft, TripStatus::Dispatched])
            .await?;
        if open_trips > 0 {
            return Err(AppError::Conflict(format!(
                "Vehicle {} has {} draft or dispatched trip(s)",
                id, open_trips
            )));
        }

        vehicle.is_active = false;
        vehicle.updated_at = Utc::now();
        tx.update_vehicle(&vehicle).await?;
        tx.commit().await?;

        log::info!("🗑️ Vehículo {} dado de baja", id);
        Ok(vehicle)
    }

    /// Registra un gasto de combustible. No toca el odómetro ni el estado.
    pub async fn record_fuel(&self, spec: NewFuelLog) -> AppResult<FuelLog> {
        check("liters", validate_positive_quantity(spec.liters, LITERS))?;
        check("cost", validate_non_negative_quantity(spec.cost, FUEL_COST))?;
        if let Some(reading) = spec.odometer_reading {
            check("odometer_reading", validate_non_negative_quantity(reading, ODOMETER))?;
        }

        let mut tx = self.store.begin().await?;
        if let Some(trip_id) = spec.trip_id {
            let trip = tx
                .lock_trip(trip_id)
                .await?
                .ok_or_else(|| not_found_error("Trip", trip_id))?;
            if trip.vehicle_id != spec.vehicle_id {
                return Err(validation_error("trip_id", "trip belongs to a different vehicle"));
            }
        }
        lock_vehicle(tx.as_mut(), spec.vehicle_id).await?;

        let log_entry = FuelLog::new(spec);
        tx.insert_fuel_log(&log_entry).await?;
        tx.commit().await?;
        Ok(log_entry)
    }

    pub async fn fuel_logs(&self, vehicle_id: Uuid) -> AppResult<Vec<FuelLog>> {
        self.get(vehicle_id).await?;
        self.store.list_fuel_logs(vehicle_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FuelType;
    use crate::repositories::MemoryStore;

    fn truck(plate: &str) -> NewVehicle {
        NewVehicle {
            license_plate: plate.to_string(),
            name: "Volvo FH".to_string(),
            model: Some("FH16".to_string()),
            year: 2021,
            fuel_type: FuelType::Diesel,
            max_load_capacity: Decimal::from(5000),
            odometer: Decimal::from(1000),
        }
    }

    fn registry() -> VehicleRegistry {
        VehicleRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_normalizes_plate_and_is_available() {
        let registry = registry();
        let vehicle = registry.create(truck("ab-123-cd")).await.unwrap();
        assert_eq!(vehicle.license_plate, "AB123CD");
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(registry.get(vehicle.id).await.unwrap(), vehicle);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let registry = registry();
        let mut spec = truck("AB-123-CD");
        spec.max_load_capacity = Decimal::ZERO;
        assert!(matches!(registry.create(spec).await, Err(AppError::Validation(_))));

        let mut spec = truck("AB-123-CD");
        spec.year = 1890;
        assert!(matches!(registry.create(spec).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_plate_conflicts() {
        let registry = registry();
        registry.create(truck("AB-123-CD")).await.unwrap();
        let err = registry.create(truck("AB 123 CD")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_odometer_cannot_decrease() {
        let registry = registry();
        let vehicle = registry.create(truck("AB-123-CD")).await.unwrap();
        registry.apply_odometer(vehicle.id, Decimal::from(1500)).await.unwrap();
        let err = registry.apply_odometer(vehicle.id, Decimal::from(1400)).await.unwrap_err();
        assert!(matches!(err, AppError::InvariantViolation(_)));
        assert_eq!(registry.get(vehicle.id).await.unwrap().odometer, Decimal::from(1500));
    }

    #[tokio::test]
    async fn test_service_state_toggle() {
        let registry = registry();
        let vehicle = registry.create(truck("AB-123-CD")).await.unwrap();
        let vehicle = registry
            .set_service_state(vehicle.id, VehicleStatus::OutOfService)
            .await
            .unwrap();
        assert_eq!(vehicle.status, VehicleStatus::OutOfService);
        let err = registry
            .set_service_state(vehicle.id, VehicleStatus::OnTrip)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_without_trips() {
        let registry = registry();
        let vehicle = registry.create(truck("AB-123-CD")).await.unwrap();
        let deleted = registry.soft_delete(vehicle.id).await.unwrap();
        assert!(!deleted.is_active);
        let active = registry
            .list(&VehicleFilters { is_active: Some(true), ..Default::default() })
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_fuel_log_validation() {
        let registry = registry();
        let vehicle = registry.create(truck("AB-123-CD")).await.unwrap();
        let entry = registry
            .record_fuel(NewFuelLog {
                vehicle_id: vehicle.id,
                trip_id: None,
                liters: Decimal::from(80),
                cost: Decimal::from(140),
                odometer_reading: Some(Decimal::from(1100)),
                filled_at: None,
            })
            .await
            .unwrap();
        assert_eq!(registry.fuel_logs(vehicle.id).await.unwrap(), vec![entry]);
        // la lectura de combustible no mueve el odómetro
        assert_eq!(registry.get(vehicle.id).await.unwrap().odometer, Decimal::from(1000));

        let err = registry
            .record_fuel(NewFuelLog {
                vehicle_id: vehicle.id,
                trip_id: None,
                liters: Decimal::ZERO,
                cost: Decimal::ONE,
                odometer_reading: None,
                filled_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_vehicle_is_not_found() {
        let registry = registry();
        assert!(matches!(registry.get(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            registry.soft_delete(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
