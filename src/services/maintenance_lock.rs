//! Bloqueo de mantenimiento
//!
//! Programar un mantenimiento pone el vehículo in_shop, lo que impide
//! cualquier despacho. Completar o cancelar el registro libera el
//! vehículo, salvo que otro registro siga activo sobre él.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{MaintenanceRecord, MaintenanceStatus, NewMaintenance, TripStatus, VehicleStatus};
use crate::repositories::{FleetStore, FleetTransaction};
use crate::services::vehicle_registry::lock_vehicle;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{check, validate_non_negative_quantity, validate_not_empty, MONEY};

pub struct MaintenanceLock {
    store: Arc<dyn FleetStore>,
}

async fn lock_record(tx: &mut dyn FleetTransaction, id: Uuid) -> AppResult<MaintenanceRecord> {
    tx.lock_maintenance(id)
        .await?
        .ok_or_else(|| not_found_error("Maintenance record", id))
}

impl MaintenanceLock {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn schedule(&self, spec: NewMaintenance) -> AppResult<MaintenanceRecord> {
        check("description", validate_not_empty(&spec.description))?;
        check("estimated_cost", validate_non_negative_quantity(spec.estimated_cost, MONEY))?;

        let mut tx = self.store.begin().await?;
        let mut vehicle = lock_vehicle(tx.as_mut(), spec.vehicle_id).await?;
        if !vehicle.is_active {
            return Err(AppError::Conflict(format!("Vehicle {} has been deactivated", vehicle.id)));
        }
        let en_route = tx.count_vehicle_trips(vehicle.id, &[TripStatus::Dispatched]).await?;
        if vehicle.status == VehicleStatus::OnTrip || en_route > 0 {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is on a trip and cannot enter the shop",
                vehicle.id
            )));
        }

        let record = MaintenanceRecord::new(spec);
        vehicle.update_status(VehicleStatus::InShop)?;
        tx.insert_maintenance(&record).await?;
        tx.update_vehicle(&vehicle).await?;
        tx.commit().await?;

        log::info!("🔧 Mantenimiento {} programado; vehículo {} en taller", record.id, vehicle.id);
        Ok(record)
    }

    pub async fn start(&self, id: Uuid) -> AppResult<MaintenanceRecord> {
        let mut tx = self.store.begin().await?;
        let mut record = lock_record(tx.as_mut(), id).await?;

        record.status = record.status.transition(MaintenanceStatus::InProgress)?;
        let now = Utc::now();
        record.started_at = Some(now);
        record.updated_at = now;

        tx.update_maintenance(&record).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn complete(&self, id: Uuid, cost: Decimal) -> AppResult<MaintenanceRecord> {
        check("cost", validate_non_negative_quantity(cost, MONEY))?;
        self.close(id, MaintenanceStatus::Completed, Some(cost)).await
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<MaintenanceRecord> {
        self.close(id, MaintenanceStatus::Cancelled, None).await
    }

    /// Cierra el registro y libera el vehículo si ya no queda ningún otro
    /// mantenimiento activo y sigue en taller.
    async fn close(
        &self,
        id: Uuid,
        target: MaintenanceStatus,
        cost: Option<Decimal>,
    ) -> AppResult<MaintenanceRecord> {
        let mut tx = self.store.begin().await?;
        let mut record = lock_record(tx.as_mut(), id).await?;
        record.status = record.status.transition(target)?;

        let now = Utc::now();
        if let Some(cost) = cost {
            record.cost = cost;
            record.completed_at = Some(now);
        }
        record.updated_at = now;

        let mut vehicle = lock_vehicle(tx.as_mut(), record.vehicle_id).await?;
        let others = tx.count_active_maintenance(vehicle.id, Some(record.id)).await?;
        let release = vehicle.status == VehicleStatus::InShop && others == 0;
        if release {
            vehicle.update_status(VehicleStatus::Available)?;
            tx.update_vehicle(&vehicle).await?;
        }

        tx.update_maintenance(&record).await?;
        tx.commit().await?;

        if release {
            log::info!("🔧 Mantenimiento {} cerrado ({}); vehículo {} disponible", id, target, vehicle.id);
        } else {
            log::info!(
                "🔧 Mantenimiento {} cerrado ({}); vehículo {} sigue {} con {} registro(s) activo(s)",
                id,
                target,
                vehicle.id,
                vehicle.status,
                others
            );
        }
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<MaintenanceRecord> {
        self.store
            .find_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance record", id))
    }

    pub async fn list(&self, vehicle_id: Option<Uuid>) -> AppResult<Vec<MaintenanceRecord>> {
        self.store.list_maintenance(vehicle_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fleet;

    #[tokio::test]
    async fn test_schedule_blocks_dispatch_until_completed() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 100).await;

        let record = fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await.unwrap();
        assert_eq!(record.status, MaintenanceStatus::Scheduled);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::InShop);

        let err = fleet.trips.dispatch(trip.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable { resource: "vehicle", .. }));
        assert_eq!(fleet.trips.get(trip.id).await.unwrap().status, TripStatus::Draft);

        let record = fleet.maintenance.complete(record.id, Decimal::from(420)).await.unwrap();
        assert_eq!(record.status, MaintenanceStatus::Completed);
        assert_eq!(record.cost, Decimal::from(420));
        assert!(record.completed_at.is_some());
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::Available);

        assert!(fleet.trips.dispatch(trip.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_schedule_rejected_while_en_route() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let trip = fleet.draft_trip(&vehicle, &fleet.driver().await, 100).await;
        fleet.trips.dispatch(trip.id).await.unwrap();

        let err = fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::OnTrip);
        assert!(fleet.maintenance.list(Some(vehicle.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_waits_for_last_active_record() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let first = fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await.unwrap();
        let second = fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await.unwrap();

        fleet.maintenance.start(first.id).await.unwrap();
        fleet.maintenance.cancel(first.id).await.unwrap();
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::InShop);

        fleet.maintenance.complete(second.id, Decimal::ZERO).await.unwrap();
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_record_transitions() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let record = fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await.unwrap();

        let started = fleet.maintenance.start(record.id).await.unwrap();
        assert_eq!(started.status, MaintenanceStatus::InProgress);
        assert!(started.started_at.is_some());
        assert!(matches!(
            fleet.maintenance.start(record.id).await,
            Err(AppError::InvalidStateTransition { entity: "maintenance", .. })
        ));

        fleet.maintenance.cancel(record.id).await.unwrap();
        assert!(matches!(
            fleet.maintenance.complete(record.id, Decimal::ONE).await,
            Err(AppError::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            fleet.maintenance.complete(record.id, Decimal::from(-1)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_schedule_validation_and_lookup() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;

        let mut spec = Fleet::maintenance_spec(&vehicle);
        spec.description = "  ".to_string();
        assert!(matches!(fleet.maintenance.schedule(spec).await, Err(AppError::Validation(_))));

        let mut spec = Fleet::maintenance_spec(&vehicle);
        spec.vehicle_id = Uuid::new_v4();
        assert!(matches!(fleet.maintenance.schedule(spec).await, Err(AppError::NotFound(_))));
        assert!(matches!(fleet.maintenance.get(Uuid::new_v4()).await, Err(AppError::NotFound(_))));

        fleet.vehicles.soft_delete(vehicle.id).await.unwrap();
        assert!(matches!(
            fleet.maintenance.schedule(Fleet::maintenance_spec(&vehicle)).await,
            Err(AppError::Conflict(_))
        ));
    }
}
