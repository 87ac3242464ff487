//! Persistence ports.
//!
//! One narrow read trait per aggregate (specialized queries are explicit port
//! methods, never predicates passed across the boundary), plus the
//! transactional [`DealershipStore`] that applies a [`WriteBatch`] atomically.
//!
//! Soft delete is modelled as an update that sets the aggregate's deleted
//! flag; reads return soft-deleted records and callers decide whether they
//! count as missing.

use thiserror::Error;

use motorlot_core::ExpectedVersion;
use motorlot_parties::{Customer, CustomerId, Employee, EmployeeId};
use motorlot_procurement::{GoodsReceipt, GoodsReceiptId, PurchaseOrder, PurchaseOrderId};
use motorlot_sales::{ReturnRequest, ReturnRequestId, SalesOrder, SalesOrderId};
use motorlot_vehicles::{Vehicle, VehicleId, Vin};

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed (stale version or vanished row).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// Insert attempted for an id that already exists.
    #[error("duplicate aggregate id: {0}")]
    DuplicateId(String),

    /// The backing store is unusable (e.g. poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Vehicle persistence port.
pub trait VehicleStore {
    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, StoreError>;

    /// VINs are globally unique across the fleet, deleted vehicles included.
    fn vehicle_by_vin(&self, vin: &Vin) -> Result<Option<Vehicle>, StoreError>;

    fn count_vehicles(&self) -> Result<usize, StoreError>;
}

/// Purchase order persistence port.
pub trait PurchaseOrderStore {
    fn purchase_order(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrder>, StoreError>;
}

/// Goods receipt persistence port.
pub trait GoodsReceiptStore {
    fn goods_receipt(&self, id: GoodsReceiptId) -> Result<Option<GoodsReceipt>, StoreError>;

    fn receipts_for_order(
        &self,
        order_id: PurchaseOrderId,
    ) -> Result<Vec<GoodsReceipt>, StoreError>;
}

/// Sales order persistence port.
pub trait SalesOrderStore {
    fn sales_order(&self, id: SalesOrderId) -> Result<Option<SalesOrder>, StoreError>;

    /// The order (if any) currently holding a reservation on the vehicle.
    fn live_order_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<SalesOrder>, StoreError>;
}

/// Return request persistence port.
pub trait ReturnRequestStore {
    fn return_request(&self, id: ReturnRequestId) -> Result<Option<ReturnRequest>, StoreError>;

    fn requests_for_order(
        &self,
        order_id: SalesOrderId,
    ) -> Result<Vec<ReturnRequest>, StoreError>;
}

/// Customer/employee resolution port.
pub trait PartyStore {
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
}

/// One staged write.
///
/// Updates carry the [`ExpectedVersion`] captured when the aggregate was
/// loaded; the store checks it at commit time so that of two racing writers
/// exactly one succeeds.
#[derive(Debug, Clone)]
pub enum WriteOp {
    InsertVehicle(Vehicle),
    UpdateVehicle {
        state: Vehicle,
        expected: ExpectedVersion,
    },
    InsertPurchaseOrder(PurchaseOrder),
    UpdatePurchaseOrder {
        state: PurchaseOrder,
        expected: ExpectedVersion,
    },
    InsertGoodsReceipt(GoodsReceipt),
    UpdateGoodsReceipt {
        state: GoodsReceipt,
        expected: ExpectedVersion,
    },
    InsertSalesOrder(SalesOrder),
    UpdateSalesOrder {
        state: SalesOrder,
        expected: ExpectedVersion,
    },
    InsertReturnRequest(ReturnRequest),
    UpdateReturnRequest {
        state: ReturnRequest,
        expected: ExpectedVersion,
    },
    InsertCustomer(Customer),
    InsertEmployee(Employee),
}

/// An ordered batch of writes that commit together or not at all.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The transactional store: every read port plus atomic batch application.
///
/// `apply` is the sole mutual-exclusion point of the system. Implementations
/// must validate the whole batch (version checks, duplicate ids) before
/// writing anything, so a failed batch leaves the store untouched.
pub trait DealershipStore:
    VehicleStore
    + PurchaseOrderStore
    + GoodsReceiptStore
    + SalesOrderStore
    + ReturnRequestStore
    + PartyStore
    + Send
    + Sync
{
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
