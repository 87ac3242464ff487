//! Command-pipeline benchmarks.
//!
//! Compares the full sales pipeline (resolution, pricing, unit of work,
//! outbox flush) against raw store writes, to keep an eye on the overhead the
//! transaction boundary adds per command.

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value as JsonValue;

use motorlot_core::{AggregateId, Currency, ExpectedVersion, Money};
use motorlot_events::{EventEnvelope, InMemoryEventBus};
use motorlot_infra::handlers::sales::{CancelSalesOrder, CreateSalesOrder};
use motorlot_infra::{
    CancellationToken, Dealership, DealershipStore, InMemoryDealershipStore, VehicleStore,
    WriteBatch, WriteOp,
};
use motorlot_parties::{Customer, CustomerId, Employee, EmployeeId, EmployeeRole};
use motorlot_pricing::{PricingConfig, PricingEngine};
use motorlot_sales::{PaymentMethod, SalesOrderId};
use motorlot_vehicles::{Vehicle, VehicleId, Vin};

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

fn unique_vin() -> Vin {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    Vin::new(format!("5YJSA1E2XJF{n:06}")).unwrap()
}

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::usd())
}

fn seed_vehicle(store: &InMemoryDealershipStore) -> VehicleId {
    let id = VehicleId::new(AggregateId::new());
    let (vehicle, _) = Vehicle::new(
        id,
        format!("LOT-{id}"),
        unique_vin(),
        "CIVIC-2024",
        "Honda",
        usd(dec!(18000)),
        usd(dec!(21500)),
        Utc::now(),
    )
    .unwrap();
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::InsertVehicle(vehicle));
    store.apply(batch).unwrap();
    id
}

fn bench_sales_pipeline(c: &mut Criterion) {
    let store = InMemoryDealershipStore::new();
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let pricing = PricingEngine::new(PricingConfig::new(dec!(8.5), dec!(5)).unwrap());
    let dealership = Dealership::new(store, bus, pricing);
    let cancel = CancellationToken::new();

    let customer_id = CustomerId::new(AggregateId::new());
    let employee_id = EmployeeId::new(AggregateId::new());
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::InsertCustomer(
        Customer::new(customer_id, "Ada Meyer", None).unwrap(),
    ));
    batch.push(WriteOp::InsertEmployee(
        Employee::new(employee_id, "Sam Ortiz", EmployeeRole::SalesRep).unwrap(),
    ));
    dealership.store().apply(batch).unwrap();

    let mut group = c.benchmark_group("sales_pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_and_cancel_order", |b| {
        b.iter_batched(
            || seed_vehicle(dealership.store()),
            |vehicle_id| {
                let order_id = dealership
                    .create_sales_order(
                        CreateSalesOrder {
                            order_id: SalesOrderId::new(AggregateId::new()),
                            customer_id,
                            vehicle_id,
                            sales_person_id: employee_id,
                            payment_method: PaymentMethod::Cash,
                            discount_percentage: Decimal::ZERO,
                            occurred_at: Utc::now(),
                        },
                        &cancel,
                    )
                    .unwrap();
                dealership
                    .cancel_sales_order(
                        CancelSalesOrder {
                            order_id,
                            reason: "benchmark".to_string(),
                            occurred_at: Utc::now(),
                        },
                        &cancel,
                    )
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_raw_store(c: &mut Criterion) {
    let store = InMemoryDealershipStore::new();

    let mut group = c.benchmark_group("raw_store");
    group.throughput(Throughput::Elements(1));

    group.bench_function("reserve_and_release", |b| {
        b.iter_batched(
            || seed_vehicle(&store),
            |vehicle_id| {
                let mut vehicle = store.vehicle(vehicle_id).unwrap().unwrap();
                let expected = ExpectedVersion::Exact(vehicle.version());
                vehicle.reserve(Utc::now()).unwrap();
                let mut batch = WriteBatch::new();
                batch.push(WriteOp::UpdateVehicle {
                    state: vehicle,
                    expected,
                });
                store.apply(batch).unwrap();

                let mut vehicle = store.vehicle(vehicle_id).unwrap().unwrap();
                let expected = ExpectedVersion::Exact(vehicle.version());
                vehicle.release(Utc::now()).unwrap();
                let mut batch = WriteBatch::new();
                batch.push(WriteOp::UpdateVehicle {
                    state: vehicle,
                    expected,
                });
                store.apply(batch).unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_sales_pipeline, bench_raw_store);
criterion_main!(benches);
