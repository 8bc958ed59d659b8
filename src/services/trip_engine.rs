//! Motor del ciclo de vida de viajes
//!
//! Cada transición (despacho, finalización, cancelación) es una única
//! transacción: se bloquean viaje, vehículo y conductor en ese orden, se
//! validan todas las precondiciones sobre copias de trabajo y se escriben
//! los tres registros juntos. Cualquier error suelta la transacción sin
//! `commit`, así que nunca queda estado parcial visible.
//!
//! El estado del vehículo y del conductor funciona como mutex: un recurso
//! en on_trip (o un vehículo in_shop) no supera la validación de un
//! segundo despacho.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Driver, DriverStatus, NewTrip, Trip, TripFilters, TripPatch, TripStatus, Vehicle, VehicleStatus,
};
use crate::repositories::{FleetStore, FleetTransaction};
use crate::services::driver_registry::lock_driver;
use crate::services::vehicle_registry::lock_vehicle;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{
    check, validate_non_negative_quantity, validate_not_empty, validate_positive_quantity, MONEY, ODOMETER, WEIGHT,
};

/// Valida y aplica un despacho sobre las copias bloqueadas.
/// No modifica nada si alguna comprobación falla.
pub fn apply_dispatch(trip: &mut Trip, vehicle: &mut Vehicle, driver: &mut Driver, today: NaiveDate) -> AppResult<()> {
    // Un segundo despacho del mismo viaje pierde contra la reserva ya tomada.
    if trip.status == TripStatus::Dispatched {
        return Err(AppError::unavailable("vehicle", vehicle.id, vehicle.status));
    }
    let next = trip.status.transition(TripStatus::Dispatched)?;

    if trip.cargo_weight > vehicle.max_load_capacity {
        return Err(AppError::CapacityExceeded {
            cargo_weight: trip.cargo_weight,
            max_load_capacity: vehicle.max_load_capacity,
        });
    }

    if !vehicle.is_active {
        return Err(AppError::unavailable("vehicle", vehicle.id, "inactive"));
    }
    if vehicle.status != VehicleStatus::Available {
        return Err(AppError::unavailable("vehicle", vehicle.id, vehicle.status));
    }

    if let Some(reason) = driver.disqualification(today) {
        return Err(AppError::DriverUnqualified {
            driver_id: driver.id,
            reason,
        });
    }
    if driver.status != DriverStatus::OnDuty {
        return Err(AppError::unavailable("driver", driver.id, driver.status));
    }

    vehicle.update_status(VehicleStatus::OnTrip)?;
    driver.update_status(DriverStatus::OnTrip);
    driver.increment_total_trips(1)?;

    let now = Utc::now();
    trip.start_odometer = Some(vehicle.odometer);
    trip.status = next;
    trip.dispatched_at = Some(now);
    trip.updated_at = now;
    Ok(())
}

/// Valida y aplica la finalización: fija odómetro final y distancia, y
/// libera vehículo y conductor.
pub fn apply_completion(
    trip: &mut Trip,
    vehicle: &mut Vehicle,
    driver: &mut Driver,
    end_odometer: Decimal,
) -> AppResult<()> {
    let next = trip.status.transition(TripStatus::Completed)?;

    let start_odometer = trip.start_odometer.ok_or_else(|| {
        AppError::InvariantViolation(format!("dispatched trip {} has no start odometer", trip.id))
    })?;
    if end_odometer < start_odometer {
        return Err(AppError::InvariantViolation(format!(
            "end odometer {} is below start odometer {}",
            end_odometer, start_odometer
        )));
    }
    if end_odometer < vehicle.odometer {
        return Err(AppError::InvariantViolation(format!(
            "end odometer {} is below vehicle odometer {}",
            end_odometer, vehicle.odometer
        )));
    }

    vehicle.apply_odometer(end_odometer)?;
    vehicle.update_status(VehicleStatus::Available)?;
    driver.update_status(DriverStatus::OnDuty);
    driver.increment_completed_trips(1)?;

    let now = Utc::now();
    trip.end_odometer = Some(end_odometer);
    trip.distance = Some(end_odometer - start_odometer);
    trip.status = next;
    trip.completed_at = Some(now);
    trip.updated_at = now;
    Ok(())
}

/// Cancela el viaje. Si estaba despachado libera los recursos y compensa
/// el incremento de total_trips hecho al despachar; un borrador no retiene
/// nada y no toca contadores. Devuelve si hubo liberación.
pub fn apply_cancellation(trip: &mut Trip, vehicle: &mut Vehicle, driver: &mut Driver) -> AppResult<bool> {
    let previous = trip.status;
    let next = previous.transition(TripStatus::Cancelled)?;

    let released = previous.holds_resources();
    if released {
        driver.increment_total_trips(-1)?;
        vehicle.update_status(VehicleStatus::Available)?;
        driver.update_status(DriverStatus::OnDuty);
    }

    let now = Utc::now();
    trip.status = next;
    trip.cancelled_at = Some(now);
    trip.updated_at = now;
    Ok(released)
}

fn validate_trip_fields(cargo_weight: Option<Decimal>, revenue: Option<Decimal>, origin: Option<&str>, destination: Option<&str>) -> AppResult<()> {
    if let Some(cargo_weight) = cargo_weight {
        check("cargo_weight", validate_positive_quantity(cargo_weight, WEIGHT))?;
    }
    if let Some(revenue) = revenue {
        check("revenue", validate_non_negative_quantity(revenue, MONEY))?;
    }
    if let Some(origin) = origin {
        check("origin", validate_not_empty(origin))?;
    }
    if let Some(destination) = destination {
        check("destination", validate_not_empty(destination))?;
    }
    Ok(())
}

pub struct TripEngine {
    store: Arc<dyn FleetStore>,
}

/// Recursos de un viaje bloqueados en orden viaje → vehículo → conductor
struct LockedTrip {
    trip: Trip,
    vehicle: Vehicle,
    driver: Driver,
}

async fn lock_trip_with_resources(tx: &mut dyn FleetTransaction, trip_id: Uuid) -> AppResult<LockedTrip> {
    let trip = tx
        .lock_trip(trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    let vehicle = lock_vehicle(tx, trip.vehicle_id).await?;
    let driver = lock_driver(tx, trip.driver_id).await?;
    Ok(LockedTrip { trip, vehicle, driver })
}

async fn persist(mut tx: Box<dyn FleetTransaction>, locked: &LockedTrip) -> AppResult<()> {
    tx.update_vehicle(&locked.vehicle).await?;
    tx.update_driver(&locked.driver).await?;
    tx.update_trip(&locked.trip).await?;
    tx.commit().await
}

impl TripEngine {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    /// Crea un viaje en borrador. No reserva vehículo ni conductor.
    pub async fn create(&self, spec: NewTrip, actor_id: Uuid) -> AppResult<Trip> {
        validate_trip_fields(
            Some(spec.cargo_weight),
            Some(spec.revenue),
            Some(&spec.origin),
            Some(&spec.destination),
        )?;

        let mut tx = self.store.begin().await?;
        let vehicle = lock_vehicle(tx.as_mut(), spec.vehicle_id).await?;
        if !vehicle.is_active {
            return Err(AppError::Conflict(format!("Vehicle {} has been deactivated", vehicle.id)));
        }
        let driver = lock_driver(tx.as_mut(), spec.driver_id).await?;
        if !driver.is_active {
            return Err(AppError::Conflict(format!("Driver {} has been deactivated", driver.id)));
        }

        let trip = Trip::new(spec, actor_id);
        tx.insert_trip(&trip).await?;
        tx.commit().await?;

        log::info!("📝 Viaje {} creado en borrador por {}", trip.id, actor_id);
        Ok(trip)
    }

    /// Edita carga, ruta o ingresos; solo mientras el viaje es borrador.
    pub async fn update(&self, trip_id: Uuid, patch: TripPatch) -> AppResult<Trip> {
        validate_trip_fields(
            patch.cargo_weight,
            patch.revenue,
            patch.origin.as_deref(),
            patch.destination.as_deref(),
        )?;

        let mut tx = self.store.begin().await?;
        let mut trip = tx
            .lock_trip(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", trip_id))?;
        if trip.status != TripStatus::Draft {
            return Err(AppError::Conflict(format!(
                "Trip {} is {} and can no longer be edited",
                trip_id, trip.status
            )));
        }

        if let Some(cargo_weight) = patch.cargo_weight {
            trip.cargo_weight = cargo_weight;
        }
        if let Some(origin) = patch.origin {
            trip.origin = origin;
        }
        if let Some(destination) = patch.destination {
            trip.destination = destination;
        }
        if let Some(revenue) = patch.revenue {
            trip.revenue = revenue;
        }
        trip.updated_at = Utc::now();

        tx.update_trip(&trip).await?;
        tx.commit().await?;
        Ok(trip)
    }

    pub async fn dispatch(&self, trip_id: Uuid) -> AppResult<Trip> {
        let mut tx = self.store.begin().await?;
        let mut locked = lock_trip_with_resources(tx.as_mut(), trip_id).await?;

        apply_dispatch(
            &mut locked.trip,
            &mut locked.vehicle,
            &mut locked.driver,
            Utc::now().date_naive(),
        )?;
        persist(tx, &locked).await?;

        log::info!(
            "🚀 Viaje {} despachado: vehículo {} y conductor {} en ruta",
            trip_id,
            locked.vehicle.id,
            locked.driver.id
        );
        Ok(locked.trip)
    }

    pub async fn complete(&self, trip_id: Uuid, end_odometer: Decimal) -> AppResult<Trip> {
        check("end_odometer", validate_non_negative_quantity(end_odometer, ODOMETER))?;
        let mut tx = self.store.begin().await?;
        let mut locked = lock_trip_with_resources(tx.as_mut(), trip_id).await?;

        apply_completion(&mut locked.trip, &mut locked.vehicle, &mut locked.driver, end_odometer)?;
        persist(tx, &locked).await?;

        log::info!(
            "✅ Viaje {} completado ({} km)",
            trip_id,
            locked.trip.distance.unwrap_or_default()
        );
        Ok(locked.trip)
    }

    pub async fn cancel(&self, trip_id: Uuid) -> AppResult<Trip> {
        let mut tx = self.store.begin().await?;
        let mut locked = lock_trip_with_resources(tx.as_mut(), trip_id).await?;

        let released = apply_cancellation(&mut locked.trip, &mut locked.vehicle, &mut locked.driver)?;
        if released {
            persist(tx, &locked).await?;
            log::info!("↩️ Viaje {} cancelado; recursos liberados", trip_id);
        } else {
            tx.update_trip(&locked.trip).await?;
            tx.commit().await?;
            log::info!("↩️ Viaje {} cancelado desde borrador", trip_id);
        }
        Ok(locked.trip)
    }

    pub async fn get(&self, trip_id: Uuid) -> AppResult<Trip> {
        self.store
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", trip_id))
    }

    pub async fn list(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        self.store.list_trips(filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisqualificationReason;
    use crate::services::test_support::Fleet;

    #[tokio::test]
    async fn test_create_is_draft_and_reserves_nothing() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;

        assert_eq!(trip.status, TripStatus::Draft);
        assert_eq!(trip.start_odometer, None);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::Available);
        assert_eq!(fleet.drivers.get(driver.id).await.unwrap().status, DriverStatus::OnDuty);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;

        let mut spec = Fleet::trip_spec(&vehicle, &driver, 0);
        assert!(matches!(
            fleet.trips.create(spec.clone(), Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        ));
        spec.cargo_weight = Decimal::from(10);
        spec.revenue = Decimal::from(-1);
        assert!(matches!(
            fleet.trips.create(spec.clone(), Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        ));
        spec.revenue = Decimal::ZERO;
        spec.cargo_weight = Decimal::from(10_000_000_000_i64);
        assert!(matches!(
            fleet.trips.create(spec.clone(), Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        ));
        spec.cargo_weight = Decimal::from(10);
        spec.vehicle_id = Uuid::new_v4();
        assert!(matches!(
            fleet.trips.create(spec, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_then_complete() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;

        let trip = fleet.trips.dispatch(trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Dispatched);
        assert_eq!(trip.start_odometer, Some(Decimal::from(1000)));
        assert!(trip.dispatched_at.is_some());
        let v = fleet.vehicles.get(vehicle.id).await.unwrap();
        let d = fleet.drivers.get(driver.id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::OnTrip);
        assert_eq!(d.status, DriverStatus::OnTrip);
        assert_eq!(d.total_trips, 1);

        let trip = fleet.trips.complete(trip.id, Decimal::from(1300)).await.unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.end_odometer, Some(Decimal::from(1300)));
        assert_eq!(trip.distance, Some(Decimal::from(300)));
        let v = fleet.vehicles.get(vehicle.id).await.unwrap();
        let d = fleet.drivers.get(driver.id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.odometer, Decimal::from(1300));
        assert_eq!(d.status, DriverStatus::OnDuty);
        assert_eq!(d.completed_trips, 1);
        assert_eq!(d.total_trips, 1);
    }

    #[tokio::test]
    async fn test_capacity_exceeded_leaves_state_unchanged() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(1000, 0).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 1001).await;

        let err = fleet.trips.dispatch(trip.id).await.unwrap_err();
        match err {
            AppError::CapacityExceeded { cargo_weight, max_load_capacity } => {
                assert_eq!(cargo_weight, Decimal::from(1001));
                assert_eq!(max_load_capacity, Decimal::from(1000));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fleet.trips.get(trip.id).await.unwrap(), trip);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap(), vehicle);
        assert_eq!(fleet.drivers.get(driver.id).await.unwrap(), driver);
    }

    #[tokio::test]
    async fn test_cargo_equal_to_capacity_dispatches() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(1000, 0).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 1000).await;
        assert!(fleet.trips.dispatch(trip.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_dispatched_compensates_counter() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;

        fleet.trips.dispatch(trip.id).await.unwrap();
        let trip = fleet.trips.cancel(trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Cancelled);
        assert!(trip.cancelled_at.is_some());

        let v = fleet.vehicles.get(vehicle.id).await.unwrap();
        let d = fleet.drivers.get(driver.id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(d.status, DriverStatus::OnDuty);
        assert_eq!(d.total_trips, driver.total_trips);

        let err = fleet.trips.dispatch(trip.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancel_draft_touches_nothing() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;

        let cancelled = fleet.trips.cancel(trip.id).await.unwrap();
        assert_eq!(cancelled.status, TripStatus::Cancelled);
        assert_eq!(fleet.drivers.get(driver.id).await.unwrap(), driver);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap(), vehicle);
        assert!(matches!(
            fleet.trips.cancel(trip.id).await,
            Err(AppError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_below_start_odometer_is_rejected() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;
        let dispatched = fleet.trips.dispatch(trip.id).await.unwrap();

        let err = fleet.trips.complete(trip.id, Decimal::from(999)).await.unwrap_err();
        assert!(matches!(err, AppError::InvariantViolation(_)));
        assert_eq!(fleet.trips.get(trip.id).await.unwrap(), dispatched);
        let v = fleet.vehicles.get(vehicle.id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::OnTrip);
        assert_eq!(v.odometer, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_complete_rejects_unstorable_odometer() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let trip = fleet.draft_trip(&vehicle, &fleet.driver().await, 100).await;
        let dispatched = fleet.trips.dispatch(trip.id).await.unwrap();

        let err = fleet.trips.complete(trip.id, Decimal::new(130025, 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fleet.trips.get(trip.id).await.unwrap(), dispatched);

        let trip = fleet.trips.complete(trip.id, Decimal::new(13003, 1)).await.unwrap();
        assert_eq!(trip.distance, Some(Decimal::new(3003, 1)));
    }

    #[tokio::test]
    async fn test_complete_requires_dispatched() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 2000).await;
        let err = fleet.trips.complete(trip.id, Decimal::from(1200)).await.unwrap_err();
        match err {
            AppError::InvalidStateTransition { current, requested, .. } => {
                assert_eq!(current, "draft");
                assert_eq!(requested, "completed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_trip_on_busy_vehicle_is_unavailable() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let first = fleet.draft_trip(&vehicle, &fleet.driver().await, 100).await;
        let second = fleet.draft_trip(&vehicle, &fleet.driver().await, 100).await;

        fleet.trips.dispatch(first.id).await.unwrap();
        let err = fleet.trips.dispatch(second.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable { resource: "vehicle", .. }));
        assert_eq!(fleet.trips.get(second.id).await.unwrap().status, TripStatus::Draft);
    }

    #[tokio::test]
    async fn test_busy_driver_is_unavailable() {
        let fleet = Fleet::new();
        let driver = fleet.driver().await;
        let first = fleet.draft_trip(&fleet.vehicle(5000, 0).await, &driver, 100).await;
        let second = fleet.draft_trip(&fleet.vehicle(5000, 0).await, &driver, 100).await;

        fleet.trips.dispatch(first.id).await.unwrap();
        let err = fleet.trips.dispatch(second.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable { resource: "driver", .. }));
    }

    #[tokio::test]
    async fn test_driver_qualification_causes() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 0).await;

        let expired = fleet.driver_with_expiry(Utc::now().date_naive()).await;
        let trip = fleet.draft_trip(&vehicle, &expired, 100).await;
        match fleet.trips.dispatch(trip.id).await.unwrap_err() {
            AppError::DriverUnqualified { reason, .. } => {
                assert!(matches!(reason, DisqualificationReason::LicenseExpired { .. }))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let suspended = fleet.driver().await;
        fleet.drivers.set_duty_status(suspended.id, DriverStatus::Suspended).await.unwrap();
        let trip = fleet.draft_trip(&vehicle, &suspended, 100).await;
        match fleet.trips.dispatch(trip.id).await.unwrap_err() {
            AppError::DriverUnqualified { reason, .. } => {
                assert_eq!(reason, DisqualificationReason::Suspended)
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let retired = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &retired, 100).await;
        fleet.drivers.soft_delete(retired.id).await.unwrap();
        match fleet.trips.dispatch(trip.id).await.unwrap_err() {
            AppError::DriverUnqualified { driver_id, reason } => {
                assert_eq!(driver_id, retired.id);
                assert_eq!(reason, DisqualificationReason::Inactive)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fleet.trips.get(trip.id).await.unwrap().status, TripStatus::Draft);
        assert_eq!(fleet.drivers.get(retired.id).await.unwrap().total_trips, 0);

        let off_duty = fleet.driver().await;
        fleet.drivers.set_duty_status(off_duty.id, DriverStatus::OffDuty).await.unwrap();
        let trip = fleet.draft_trip(&vehicle, &off_duty, 100).await;
        assert!(matches!(
            fleet.trips.dispatch(trip.id).await,
            Err(AppError::ResourceUnavailable { resource: "driver", .. })
        ));

        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_update_only_while_draft() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 0).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 100).await;

        let patch = TripPatch {
            cargo_weight: Some(Decimal::from(250)),
            destination: Some("Marseille".to_string()),
            ..Default::default()
        };
        let updated = fleet.trips.update(trip.id, patch.clone()).await.unwrap();
        assert_eq!(updated.cargo_weight, Decimal::from(250));
        assert_eq!(updated.destination, "Marseille");

        let bad = TripPatch { cargo_weight: Some(Decimal::ZERO), ..Default::default() };
        assert!(matches!(fleet.trips.update(trip.id, bad).await, Err(AppError::Validation(_))));

        fleet.trips.dispatch(trip.id).await.unwrap();
        assert!(matches!(fleet.trips.update(trip.id, patch).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_trip_write_rolls_back_dispatch() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 100).await;

        fleet.store.fail_trip_writes(true);
        assert!(matches!(fleet.trips.dispatch(trip.id).await, Err(AppError::Internal(_))));
        fleet.store.fail_trip_writes(false);

        assert_eq!(fleet.trips.get(trip.id).await.unwrap(), trip);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap(), vehicle);
        assert_eq!(fleet.drivers.get(driver.id).await.unwrap(), driver);
        assert!(fleet.trips.dispatch(trip.id).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch_same_vehicle_has_one_winner() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let mut trip_ids = Vec::new();
        for _ in 0..8 {
            let driver = fleet.driver().await;
            trip_ids.push(fleet.draft_trip(&vehicle, &driver, 100).await.id);
        }

        let handles: Vec<_> = trip_ids
            .iter()
            .map(|&id| {
                let engine = TripEngine::new(fleet.dyn_store());
                tokio::spawn(async move { engine.dispatch(id).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(trip) => {
                    winners += 1;
                    assert_eq!(trip.status, TripStatus::Dispatched);
                }
                Err(err) => assert!(
                    matches!(err, AppError::ResourceUnavailable { resource: "vehicle", .. }),
                    "unexpected error: {:?}",
                    err
                ),
            }
        }
        assert_eq!(winners, 1);

        let dispatched = fleet
            .trips
            .list(&TripFilters {
                status: Some(TripStatus::Dispatched),
                vehicle_id: Some(vehicle.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().status, VehicleStatus::OnTrip);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_dispatch_same_trip() {
        let fleet = Fleet::new();
        let vehicle = fleet.vehicle(5000, 1000).await;
        let driver = fleet.driver().await;
        let trip = fleet.draft_trip(&vehicle, &driver, 100).await;

        let a = TripEngine::new(fleet.dyn_store());
        let b = TripEngine::new(fleet.dyn_store());
        let (first, second) = futures::future::join(a.dispatch(trip.id), b.dispatch(trip.id)).await;

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::ResourceUnavailable { .. }))));
        assert_eq!(fleet.drivers.get(driver.id).await.unwrap().total_trips, 1);
    }

    #[test]
    fn test_apply_dispatch_validates_before_mutating() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let (mut trip, mut vehicle, mut driver) = Fleet::detached(1000, 1500);
        let before = (trip.clone(), vehicle.clone(), driver.clone());

        assert!(apply_dispatch(&mut trip, &mut vehicle, &mut driver, today).is_err());
        assert_eq!((trip, vehicle, driver), before);
    }

    #[test]
    fn test_status_path_is_closed() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let (mut trip, mut vehicle, mut driver) = Fleet::detached(5000, 100);
        let mut path = vec![trip.status];

        apply_dispatch(&mut trip, &mut vehicle, &mut driver, today).unwrap();
        path.push(trip.status);
        apply_completion(&mut trip, &mut vehicle, &mut driver, Decimal::from(50)).unwrap();
        path.push(trip.status);
        assert!(apply_cancellation(&mut trip, &mut vehicle, &mut driver).is_err());

        assert_eq!(path, vec![TripStatus::Draft, TripStatus::Dispatched, TripStatus::Completed]);
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
        assert!(trip.start_odometer <= trip.end_odometer);
    }
}
