//! Registro de conductores
//!
//! Alta, edición y baja lógica de conductores, más el cambio manual de
//! estado de servicio. El estado on_trip pertenece al motor de viajes.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Driver, DriverFilters, DriverPatch, DriverStatus, NewDriver, TripStatus};
use crate::repositories::{FleetStore, FleetTransaction};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{check, validate_license_number, validate_not_empty, validate_phone, validate_range};

pub struct DriverRegistry {
    store: Arc<dyn FleetStore>,
}

pub(crate) async fn lock_driver(tx: &mut dyn FleetTransaction, id: Uuid) -> AppResult<Driver> {
    tx.lock_driver(id)
        .await?
        .ok_or_else(|| not_found_error("Driver", id))
}

fn validate_new_driver(spec: &NewDriver) -> AppResult<()> {
    check("full_name", validate_not_empty(&spec.full_name))?;
    check("phone", validate_phone(&spec.phone))?;
    check("license_number", validate_license_number(&spec.license_number))?;
    check("license_category", validate_not_empty(&spec.license_category))?;
    check("safety_score", validate_range(spec.safety_score, 0, 100))?;
    Ok(())
}

impl DriverRegistry {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut spec: NewDriver) -> AppResult<Driver> {
        validate_new_driver(&spec)?;
        spec.license_number = spec.license_number.trim().to_uppercase();

        let mut tx = self.store.begin().await?;
        if tx.license_number_taken(&spec.license_number, None).await? {
            return Err(conflict_error("Driver", "license_number", &spec.license_number));
        }
        let driver = Driver::new(spec);
        tx.insert_driver(&driver).await?;
        tx.commit().await?;

        log::info!("👤 Conductor {} registrado", driver.id);
        Ok(driver)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Driver> {
        self.store
            .find_driver(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", id))
    }

    pub async fn list(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        self.store.list_drivers(filters).await
    }

    pub async fn update(&self, id: Uuid, patch: DriverPatch) -> AppResult<Driver> {
        let mut tx = self.store.begin().await?;
        let mut driver = lock_driver(tx.as_mut(), id).await?;

        if let Some(number) = patch.license_number {
            check("license_number", validate_license_number(&number))?;
            let number = number.trim().to_uppercase();
            if tx.license_number_taken(&number, Some(id)).await? {
                return Err(conflict_error("Driver", "license_number", &number));
            }
            driver.license_number = number;
        }
        if let Some(full_name) = patch.full_name {
            check("full_name", validate_not_empty(&full_name))?;
            driver.full_name = full_name;
        }
        if let Some(phone) = patch.phone {
            check("phone", validate_phone(&phone))?;
            driver.phone = phone;
        }
        if let Some(email) = patch.email {
            driver.email = Some(email);
        }
        if let Some(category) = patch.license_category {
            check("license_category", validate_not_empty(&category))?;
            driver.license_category = category;
        }
        if let Some(expiry) = patch.license_expiry_date {
            driver.license_expiry_date = expiry;
        }
        if let Some(score) = patch.safety_score {
            check("safety_score", validate_range(score, 0, 100))?;
            driver.safety_score = score;
        }
        driver.updated_at = Utc::now();

        tx.update_driver(&driver).await?;
        tx.commit().await?;
        Ok(driver)
    }

    /// Cambio manual de estado. Nunca entra ni sale de on_trip.
    pub async fn set_duty_status(&self, id: Uuid, status: DriverStatus) -> AppResult<Driver> {
        let mut tx = self.store.begin().await?;
        let mut driver = lock_driver(tx.as_mut(), id).await?;

        if status == DriverStatus::OnTrip || driver.status == DriverStatus::OnTrip {
            return Err(AppError::Conflict(format!(
                "Driver {} cannot be moved manually from {} to {}",
                id, driver.status, status
            )));
        }
        driver.update_status(status);
        tx.update_driver(&driver).await?;
        tx.commit().await?;

        log::info!("👤 Conductor {} ahora {}", id, status);
        Ok(driver)
    }

    /// Baja lógica. No se bloquea por viajes activos; solo se advierte.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<Driver> {
        let mut tx = self.store.begin().await?;
        let mut driver = lock_driver(tx.as_mut(), id).await?;

        let dispatched = tx.count_driver_trips(id, &[TripStatus::Dispatched]).await?;
        if dispatched > 0 {
            log::warn!("⚠️ Conductor {} dado de baja con {} viaje(s) en curso", id, dispatched);
        }

        driver.is_active = false;
        driver.updated_at = Utc::now();
        tx.update_driver(&driver).await?;
        tx.commit().await?;
        Ok(driver)
    }
}
