//! Command surface of the dealership engine.
//!
//! [`Dealership`] is the application service consumed by the (out-of-scope)
//! API layer. Every command takes a plain input record plus a cooperative
//! [`CancellationToken`] and returns a typed failure on any illegal request;
//! multi-aggregate commands commit through one [`UnitOfWork`](crate::UnitOfWork)
//! so their writes land together or not at all.

pub mod procurement;
pub mod sales;
pub mod vehicles;

use serde_json::Value as JsonValue;
use thiserror::Error;

use motorlot_core::DomainError;
use motorlot_events::{EventBus, EventEnvelope, OutboxError};
use motorlot_parties::{Customer, CustomerId, Employee, EmployeeId};
use motorlot_pricing::PricingEngine;
use motorlot_procurement::{GoodsReceipt, GoodsReceiptId, PurchaseOrder, PurchaseOrderId};
use motorlot_sales::{ReturnRequest, ReturnRequestId, SalesOrder, SalesOrderId};
use motorlot_vehicles::{Vehicle, VehicleId};

use crate::cancel::CancellationToken;
use crate::store::{DealershipStore, StoreError};
use crate::unit_of_work::UnitOfWork;

pub(crate) const AGGREGATE_VEHICLE: &str = "vehicles.vehicle";
pub(crate) const AGGREGATE_PURCHASE_ORDER: &str = "procurement.purchase_order";
pub(crate) const AGGREGATE_GOODS_RECEIPT: &str = "procurement.goods_receipt";
pub(crate) const AGGREGATE_SALES_ORDER: &str = "sales.order";
pub(crate) const AGGREGATE_RETURN_REQUEST: &str = "sales.return_request";

/// Command handler boundary error.
///
/// Domain and store failures propagate here unchanged in meaning; nothing is
/// swallowed and nothing is retried automatically. A `Conflict` means the
/// caller lost an optimistic-concurrency race and may retry the whole command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("vehicle not available: {0}")]
    VehicleNotAvailable(String),

    #[error("price below floor: {0}")]
    PriceBelowFloor(String),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Optimistic concurrency failure at commit time.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller cancelled before the command reached its commit.
    #[error("command cancelled")]
    Cancelled,

    /// Event payload serialization failed while recording to the outbox.
    #[error("event serialization failed: {0}")]
    Serialize(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Publication failed after a successful commit (at-least-once; the
    /// writes stand, retrying publication is safe).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<DomainError> for CommandError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => CommandError::Validation(msg),
            DomainError::InvalidStateTransition(msg) => CommandError::InvalidStateTransition(msg),
            DomainError::VehicleNotAvailable(msg) => CommandError::VehicleNotAvailable(msg),
            DomainError::PriceBelowFloor(msg) => CommandError::PriceBelowFloor(msg),
            DomainError::InvalidId(msg) => CommandError::Validation(msg),
            DomainError::EntityNotFound(msg) => CommandError::EntityNotFound(msg),
            DomainError::ConcurrencyConflict(msg) => CommandError::Conflict(msg),
            DomainError::Unauthorized => CommandError::Unauthorized,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => CommandError::Conflict(msg),
            other => CommandError::Store(other),
        }
    }
}

impl From<OutboxError> for CommandError {
    fn from(value: OutboxError) -> Self {
        match value {
            OutboxError::Serialize(msg) => CommandError::Serialize(msg),
        }
    }
}

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), CommandError> {
    if cancel.is_cancelled() {
        return Err(CommandError::Cancelled);
    }
    Ok(())
}

/// The dealership application service.
///
/// Stateless between commands: all state lives in the store, events go out
/// through the bus, and pricing configuration is read-only.
#[derive(Debug)]
pub struct Dealership<S, B> {
    store: S,
    bus: B,
    pricing: PricingEngine,
}

impl<S, B> Dealership<S, B> {
    pub fn new(store: S, bus: B, pricing: PricingEngine) -> Self {
        Self {
            store,
            bus,
            pricing,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> Dealership<S, B>
where
    S: DealershipStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub(crate) fn begin(&self) -> UnitOfWork<'_, S, B> {
        UnitOfWork::new(&self.store, &self.bus)
    }

    /// Resolve a vehicle; soft-deleted counts as missing.
    pub(crate) fn require_vehicle(&self, id: VehicleId) -> Result<Vehicle, CommandError> {
        match self.store.vehicle(id)? {
            Some(v) if !v.is_deleted() => Ok(v),
            _ => Err(CommandError::EntityNotFound(format!("vehicle {id}"))),
        }
    }

    pub(crate) fn require_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, CommandError> {
        match self.store.purchase_order(id)? {
            Some(o) if !o.is_deleted() => Ok(o),
            _ => Err(CommandError::EntityNotFound(format!("purchase order {id}"))),
        }
    }

    pub(crate) fn require_goods_receipt(
        &self,
        id: GoodsReceiptId,
    ) -> Result<GoodsReceipt, CommandError> {
        match self.store.goods_receipt(id)? {
            Some(r) if !r.is_deleted() => Ok(r),
            _ => Err(CommandError::EntityNotFound(format!("goods receipt {id}"))),
        }
    }

    pub(crate) fn require_sales_order(
        &self,
        id: SalesOrderId,
    ) -> Result<SalesOrder, CommandError> {
        match self.store.sales_order(id)? {
            Some(o) if !o.is_deleted() => Ok(o),
            _ => Err(CommandError::EntityNotFound(format!("sales order {id}"))),
        }
    }

    pub(crate) fn require_return_request(
        &self,
        id: ReturnRequestId,
    ) -> Result<ReturnRequest, CommandError> {
        match self.store.return_request(id)? {
            Some(r) => Ok(r),
            None => Err(CommandError::EntityNotFound(format!("return request {id}"))),
        }
    }

    pub(crate) fn require_customer(&self, id: CustomerId) -> Result<Customer, CommandError> {
        match self.store.customer(id)? {
            Some(c) if !c.is_deleted() => Ok(c),
            _ => Err(CommandError::EntityNotFound(format!("customer {id}"))),
        }
    }

    pub(crate) fn require_employee(&self, id: EmployeeId) -> Result<Employee, CommandError> {
        match self.store.employee(id)? {
            Some(e) if !e.is_deleted() => Ok(e),
            _ => Err(CommandError::EntityNotFound(format!("employee {id}"))),
        }
    }
}
