//! Vehicle commands outside the order pipelines: registration, servicing,
//! damage, restocking, soft delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use motorlot_core::{AggregateRoot, DomainResult, ExpectedVersion};
use motorlot_events::{EventBus, EventEnvelope};
use motorlot_vehicles::{Vehicle, VehicleEvent, VehicleId};

use crate::cancel::CancellationToken;
use crate::store::{DealershipStore, WriteOp};

use super::{AGGREGATE_VEHICLE, CommandError, Dealership, ensure_not_cancelled};

/// Command: RegisterVehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterVehicle {
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub registered_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
}

/// Command: RestockVehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockVehicle {
    pub vehicle_id: VehicleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkVehicleDamaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkVehicleDamaged {
    pub vehicle_id: VehicleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SendVehicleToService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendVehicleToService {
    pub vehicle_id: VehicleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteVehicleService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteVehicleService {
    pub vehicle_id: VehicleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReactivateVehicle (manual reactivation after damage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateVehicle {
    pub vehicle_id: VehicleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteVehicle (soft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteVehicle {
    pub vehicle_id: VehicleId,
}

impl<S, B> Dealership<S, B>
where
    S: DealershipStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn register_vehicle(
        &self,
        input: RegisterVehicle,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.register(input.plate_number, input.registered_on, input.expires_on)
        })
    }

    pub fn restock_vehicle(
        &self,
        input: RestockVehicle,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.restock(input.occurred_at)
        })
    }

    pub fn mark_vehicle_damaged(
        &self,
        input: MarkVehicleDamaged,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.mark_damaged(input.occurred_at)
        })
    }

    pub fn send_vehicle_to_service(
        &self,
        input: SendVehicleToService,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.send_to_service(input.occurred_at)
        })
    }

    pub fn complete_vehicle_service(
        &self,
        input: CompleteVehicleService,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.complete_service(input.occurred_at)
        })
    }

    pub fn reactivate_vehicle(
        &self,
        input: ReactivateVehicle,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_vehicle(input.vehicle_id, cancel, |vehicle| {
            vehicle.reactivate(input.occurred_at)
        })
    }

    pub fn delete_vehicle(
        &self,
        input: DeleteVehicle,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut vehicle = self.require_vehicle(input.vehicle_id)?;
        let expected = ExpectedVersion::Exact(vehicle.version());
        vehicle.mark_deleted()?;

        let mut uow = self.begin();
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(vehicle_id = %input.vehicle_id, "vehicle soft-deleted");
        Ok(())
    }

    /// Load-mutate-commit cycle for a single vehicle.
    fn mutate_vehicle(
        &self,
        vehicle_id: VehicleId,
        cancel: &CancellationToken,
        mutate: impl FnOnce(&mut Vehicle) -> DomainResult<VehicleEvent>,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut vehicle = self.require_vehicle(vehicle_id)?;
        let expected = ExpectedVersion::Exact(vehicle.version());
        let event = mutate(&mut vehicle)?;

        let mut uow = self.begin();
        uow.record(vehicle_id.0, AGGREGATE_VEHICLE, &event)?;
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(vehicle_id = %vehicle_id, "vehicle updated");
        Ok(())
    }
}
