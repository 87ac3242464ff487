//! In-memory dealership store.
//!
//! Intended for tests/dev. Not optimized for performance, but it enforces the
//! same contract a production backend must: atomic batch application with
//! optimistic concurrency checks under a single writer lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use motorlot_core::{AggregateRoot, Entity, ExpectedVersion};
use motorlot_parties::{Customer, CustomerId, Employee, EmployeeId};
use motorlot_procurement::{GoodsReceipt, GoodsReceiptId, PurchaseOrder, PurchaseOrderId};
use motorlot_sales::{ReturnRequest, ReturnRequestId, SalesOrder, SalesOrderId};
use motorlot_vehicles::{Vehicle, VehicleId, Vin};

use super::port::{
    DealershipStore, GoodsReceiptStore, PartyStore, PurchaseOrderStore, ReturnRequestStore,
    SalesOrderStore, StoreError, VehicleStore, WriteBatch, WriteOp,
};

#[derive(Debug, Default)]
struct Tables {
    vehicles: HashMap<VehicleId, Vehicle>,
    purchase_orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    goods_receipts: HashMap<GoodsReceiptId, GoodsReceipt>,
    sales_orders: HashMap<SalesOrderId, SalesOrder>,
    return_requests: HashMap<ReturnRequestId, ReturnRequest>,
    customers: HashMap<CustomerId, Customer>,
    employees: HashMap<EmployeeId, Employee>,
}

/// In-memory store over one big reader/writer lock.
#[derive(Debug, Default)]
pub struct InMemoryDealershipStore {
    tables: RwLock<Tables>,
}

impl InMemoryDealershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

fn ensure_insertable<K, V>(map: &HashMap<K, V>, key: &K, what: &str) -> Result<(), StoreError>
where
    K: Eq + Hash + core::fmt::Display,
{
    if map.contains_key(key) {
        return Err(StoreError::DuplicateId(format!("{what} {key}")));
    }
    Ok(())
}

fn ensure_updatable<K, V>(
    map: &HashMap<K, V>,
    key: &K,
    expected: ExpectedVersion,
    what: &str,
) -> Result<(), StoreError>
where
    K: Eq + Hash + core::fmt::Display,
    V: AggregateRoot,
{
    match map.get(key) {
        None => Err(StoreError::Concurrency(format!(
            "{what} {key} no longer exists"
        ))),
        Some(current) if !expected.matches(current.version()) => {
            Err(StoreError::Concurrency(format!(
                "{what} {key}: expected {expected:?}, found {}",
                current.version()
            )))
        }
        Some(_) => Ok(()),
    }
}

impl VehicleStore for InMemoryDealershipStore {
    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.vehicles.get(&id).cloned())
    }

    fn vehicle_by_vin(&self, vin: &Vin) -> Result<Option<Vehicle>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.vehicles.values().find(|v| v.vin() == vin).cloned())
    }

    fn count_vehicles(&self) -> Result<usize, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.vehicles.len())
    }
}

impl PurchaseOrderStore for InMemoryDealershipStore {
    fn purchase_order(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrder>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.purchase_orders.get(&id).cloned())
    }
}

impl GoodsReceiptStore for InMemoryDealershipStore {
    fn goods_receipt(&self, id: GoodsReceiptId) -> Result<Option<GoodsReceipt>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.goods_receipts.get(&id).cloned())
    }

    fn receipts_for_order(
        &self,
        order_id: PurchaseOrderId,
    ) -> Result<Vec<GoodsReceipt>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .goods_receipts
            .values()
            .filter(|r| r.purchase_order_id() == order_id)
            .cloned()
            .collect())
    }
}

impl SalesOrderStore for InMemoryDealershipStore {
    fn sales_order(&self, id: SalesOrderId) -> Result<Option<SalesOrder>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.sales_orders.get(&id).cloned())
    }

    fn live_order_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<SalesOrder>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .sales_orders
            .values()
            .find(|o| o.vehicle_id() == vehicle_id && o.is_live())
            .cloned())
    }
}

impl ReturnRequestStore for InMemoryDealershipStore {
    fn return_request(&self, id: ReturnRequestId) -> Result<Option<ReturnRequest>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.return_requests.get(&id).cloned())
    }

    fn requests_for_order(
        &self,
        order_id: SalesOrderId,
    ) -> Result<Vec<ReturnRequest>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .return_requests
            .values()
            .filter(|r| r.order_id() == order_id)
            .cloned()
            .collect())
    }
}

impl PartyStore for InMemoryDealershipStore {
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.customers.get(&id).cloned())
    }

    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.employees.get(&id).cloned())
    }
}

impl DealershipStore for InMemoryDealershipStore {
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;

        // Phase 1: validate the whole batch against current state. Nothing is
        // written until every op has passed.
        for op in batch.ops() {
            match op {
                WriteOp::InsertVehicle(v) => {
                    ensure_insertable(&tables.vehicles, v.id(), "vehicle")?
                }
                WriteOp::UpdateVehicle { state, expected } => {
                    ensure_updatable(&tables.vehicles, state.id(), *expected, "vehicle")?
                }
                WriteOp::InsertPurchaseOrder(o) => {
                    ensure_insertable(&tables.purchase_orders, o.id(), "purchase order")?
                }
                WriteOp::UpdatePurchaseOrder { state, expected } => ensure_updatable(
                    &tables.purchase_orders,
                    state.id(),
                    *expected,
                    "purchase order",
                )?,
                WriteOp::InsertGoodsReceipt(r) => {
                    ensure_insertable(&tables.goods_receipts, r.id(), "goods receipt")?
                }
                WriteOp::UpdateGoodsReceipt { state, expected } => ensure_updatable(
                    &tables.goods_receipts,
                    state.id(),
                    *expected,
                    "goods receipt",
                )?,
                WriteOp::InsertSalesOrder(o) => {
                    ensure_insertable(&tables.sales_orders, o.id(), "sales order")?
                }
                WriteOp::UpdateSalesOrder { state, expected } => {
                    ensure_updatable(&tables.sales_orders, state.id(), *expected, "sales order")?
                }
                WriteOp::InsertReturnRequest(r) => {
                    ensure_insertable(&tables.return_requests, r.id(), "return request")?
                }
                WriteOp::UpdateReturnRequest { state, expected } => ensure_updatable(
                    &tables.return_requests,
                    state.id(),
                    *expected,
                    "return request",
                )?,
                WriteOp::InsertCustomer(c) => {
                    ensure_insertable(&tables.customers, c.id(), "customer")?
                }
                WriteOp::InsertEmployee(e) => {
                    ensure_insertable(&tables.employees, e.id(), "employee")?
                }
            }
        }

        // Phase 2: apply. Cannot fail after validation.
        for op in batch.into_ops() {
            match op {
                WriteOp::InsertVehicle(v) | WriteOp::UpdateVehicle { state: v, .. } => {
                    tables.vehicles.insert(v.id_typed(), v);
                }
                WriteOp::InsertPurchaseOrder(o)
                | WriteOp::UpdatePurchaseOrder { state: o, .. } => {
                    tables.purchase_orders.insert(o.id_typed(), o);
                }
                WriteOp::InsertGoodsReceipt(r) | WriteOp::UpdateGoodsReceipt { state: r, .. } => {
                    tables.goods_receipts.insert(r.id_typed(), r);
                }
                WriteOp::InsertSalesOrder(o) | WriteOp::UpdateSalesOrder { state: o, .. } => {
                    tables.sales_orders.insert(o.id_typed(), o);
                }
                WriteOp::InsertReturnRequest(r)
                | WriteOp::UpdateReturnRequest { state: r, .. } => {
                    tables.return_requests.insert(r.id_typed(), r);
                }
                WriteOp::InsertCustomer(c) => {
                    tables.customers.insert(*c.id(), c);
                }
                WriteOp::InsertEmployee(e) => {
                    tables.employees.insert(*e.id(), e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use motorlot_core::{AggregateId, Currency, Money};
    use rust_decimal_macros::dec;

    fn test_vehicle() -> Vehicle {
        let (vehicle, _) = Vehicle::new(
            VehicleId::new(AggregateId::new()),
            "LOT-0001",
            Vin::new("1HGBH41JXMN109186").unwrap(),
            "CIVIC-2024",
            "Honda",
            Money::new(dec!(18000), Currency::usd()),
            Money::new(dec!(21500), Currency::usd()),
            Utc::now(),
        )
        .unwrap();
        vehicle
    }

    #[test]
    fn insert_then_load_round_trips() {
        let store = InMemoryDealershipStore::new();
        let vehicle = test_vehicle();
        let id = vehicle.id_typed();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(vehicle.clone()));
        store.apply(batch).unwrap();

        assert_eq!(store.vehicle(id).unwrap(), Some(vehicle));
        assert_eq!(store.count_vehicles().unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryDealershipStore::new();
        let vehicle = test_vehicle();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(vehicle.clone()));
        store.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(vehicle));
        let err = store.apply(batch).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn stale_update_fails_with_concurrency_error() {
        let store = InMemoryDealershipStore::new();
        let vehicle = test_vehicle();
        let id = vehicle.id_typed();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(vehicle));
        store.apply(batch).unwrap();

        // Two writers load version 1; both mutate; only one may win.
        let mut first = store.vehicle(id).unwrap().unwrap();
        let mut second = store.vehicle(id).unwrap().unwrap();
        let expected = ExpectedVersion::Exact(first.version());

        first.reserve(Utc::now()).unwrap();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateVehicle {
            state: first,
            expected,
        });
        store.apply(batch).unwrap();

        second.mark_damaged(Utc::now()).unwrap();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateVehicle {
            state: second,
            expected,
        });
        let err = store.apply(batch).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        // The winner's write is visible, the loser's is not.
        assert_eq!(
            store.vehicle(id).unwrap().unwrap().status(),
            motorlot_vehicles::VehicleStatus::Reserved
        );
    }

    #[test]
    fn failed_batches_apply_nothing() {
        let store = InMemoryDealershipStore::new();
        let existing = test_vehicle();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(existing.clone()));
        store.apply(batch).unwrap();

        // Valid insert + stale update in one batch: the whole batch must fail.
        let fresh = test_vehicle();
        let mut stale = store.vehicle(existing.id_typed()).unwrap().unwrap();
        stale.reserve(Utc::now()).unwrap();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertVehicle(fresh.clone()));
        batch.push(WriteOp::UpdateVehicle {
            state: stale,
            expected: ExpectedVersion::Exact(99),
        });

        assert!(store.apply(batch).is_err());
        assert_eq!(store.vehicle(fresh.id_typed()).unwrap(), None);
        assert_eq!(
            store.vehicle(existing.id_typed()).unwrap().unwrap().status(),
            motorlot_vehicles::VehicleStatus::Available
        );
    }
}
