//! Flota en memoria para los tests de servicios.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Driver, FuelType, NewDriver, NewMaintenance, NewTrip, NewVehicle, Trip, Vehicle};
use crate::repositories::{FleetStore, MemoryStore};
use crate::services::{DriverRegistry, MaintenanceLock, TripEngine, VehicleRegistry};

pub(crate) struct Fleet {
    pub store: Arc<MemoryStore>,
    pub vehicles: VehicleRegistry,
    pub drivers: DriverRegistry,
    pub trips: TripEngine,
    pub maintenance: MaintenanceLock,
}

fn unique_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn vehicle_spec(capacity: i64, odometer: i64) -> NewVehicle {
    NewVehicle {
        license_plate: unique_code(),
        name: "Renault Master".to_string(),
        model: Some("L3H2".to_string()),
        year: 2021,
        fuel_type: FuelType::Diesel,
        max_load_capacity: Decimal::from(capacity),
        odometer: Decimal::from(odometer),
    }
}

fn driver_spec(expiry: NaiveDate) -> NewDriver {
    NewDriver {
        full_name: "Camille Durand".to_string(),
        phone: "0611223344".to_string(),
        email: None,
        license_number: format!("DL-{}", unique_code()),
        license_category: "C".to_string(),
        license_expiry_date: expiry,
        safety_score: 90,
    }
}

impl Fleet {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn FleetStore> = store.clone();
        Self {
            vehicles: VehicleRegistry::new(shared.clone()),
            drivers: DriverRegistry::new(shared.clone()),
            trips: TripEngine::new(shared.clone()),
            maintenance: MaintenanceLock::new(shared),
            store,
        }
    }

    pub fn dyn_store(&self) -> Arc<dyn FleetStore> {
        self.store.clone()
    }

    pub async fn vehicle(&self, capacity: i64, odometer: i64) -> Vehicle {
        self.vehicles.create(vehicle_spec(capacity, odometer)).await.unwrap()
    }

    pub async fn driver(&self) -> Driver {
        self.driver_with_expiry(NaiveDate::from_ymd_opt(2099, 12, 31).unwrap()).await
    }

    pub async fn driver_with_expiry(&self, expiry: NaiveDate) -> Driver {
        self.drivers.create(driver_spec(expiry)).await.unwrap()
    }

    pub fn trip_spec(vehicle: &Vehicle, driver: &Driver, cargo: i64) -> NewTrip {
        NewTrip {
            vehicle_id: vehicle.id,
            driver_id: driver.id,
            cargo_weight: Decimal::from(cargo),
            origin: "Lyon".to_string(),
            destination: "Paris".to_string(),
            revenue: Decimal::from(1200),
        }
    }

    pub async fn draft_trip(&self, vehicle: &Vehicle, driver: &Driver, cargo: i64) -> Trip {
        self.trips
            .create(Self::trip_spec(vehicle, driver, cargo), Uuid::new_v4())
            .await
            .unwrap()
    }

    pub fn maintenance_spec(vehicle: &Vehicle) -> NewMaintenance {
        NewMaintenance {
            vehicle_id: vehicle.id,
            description: "Cambio de frenos".to_string(),
            scheduled_for: Utc::now().date_naive(),
            estimated_cost: Decimal::from(300),
        }
    }

    /// Viaje en borrador con su vehículo y conductor, sin pasar por ningún store.
    pub fn detached(capacity: i64, cargo: i64) -> (Trip, Vehicle, Driver) {
        let vehicle = Vehicle::new(vehicle_spec(capacity, 0));
        let driver = Driver::new(driver_spec(NaiveDate::from_ymd_opt(2099, 12, 31).unwrap()));
        let trip = Trip::new(Self::trip_spec(&vehicle, &driver, cargo), Uuid::new_v4());
        (trip, vehicle, driver)
    }
}
