//! Sales commands: orders and return requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use motorlot_core::{AggregateRoot, ExpectedVersion, Money};
use motorlot_events::{EventBus, EventEnvelope};
use motorlot_parties::{CustomerId, EmployeeId};
use motorlot_sales::{
    PaymentMethod, ReturnRequest, ReturnRequestId, ReturnRequestStatus, SalesOrder, SalesOrderId,
    SalesOrderStatus,
};
use motorlot_vehicles::{VehicleId, VehicleStatus};

use crate::cancel::CancellationToken;
use crate::store::{DealershipStore, WriteOp};

use super::{
    AGGREGATE_RETURN_REQUEST, AGGREGATE_SALES_ORDER, AGGREGATE_VEHICLE, CommandError, Dealership,
    ensure_not_cancelled,
};

/// Command: CreateSalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrder {
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub sales_person_id: EmployeeId,
    pub payment_method: PaymentMethod,
    /// Percentage off the vehicle's list price, `[0, 100]`.
    pub discount_percentage: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartProcessingSalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProcessingSalesOrder {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteSalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSalesOrder {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelSalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSalesOrder {
    pub order_id: SalesOrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteSalesOrder (soft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSalesOrder {
    pub order_id: SalesOrderId,
}

/// Command: CreateReturnRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReturnRequest {
    pub request_id: ReturnRequestId,
    pub order_id: SalesOrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AcceptReturnRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptReturnRequest {
    pub request_id: ReturnRequestId,
    /// Defaults to the order total when omitted.
    pub refund_amount: Option<Money>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectReturnRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectReturnRequest {
    pub request_id: ReturnRequestId,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl<S, B> Dealership<S, B>
where
    S: DealershipStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Create a sales order and reserve its vehicle, atomically.
    ///
    /// Fails with `EntityNotFound` for missing or soft-deleted parties and
    /// vehicles, `VehicleNotAvailable` when the vehicle is not on the lot,
    /// `Unauthorized` when the salesperson may not sell, and `PriceBelowFloor`
    /// when the discount undercuts the configured margin.
    pub fn create_sales_order(
        &self,
        input: CreateSalesOrder,
        cancel: &CancellationToken,
    ) -> Result<SalesOrderId, CommandError> {
        ensure_not_cancelled(cancel)?;

        let customer = self.require_customer(input.customer_id)?;
        let sales_person = self.require_employee(input.sales_person_id)?;
        let mut vehicle = self.require_vehicle(input.vehicle_id)?;

        if vehicle.status() != VehicleStatus::Available {
            return Err(CommandError::VehicleNotAvailable(format!(
                "vehicle {} is {}",
                input.vehicle_id,
                vehicle.status()
            )));
        }
        if self.store().live_order_for_vehicle(input.vehicle_id)?.is_some() {
            return Err(CommandError::VehicleNotAvailable(format!(
                "vehicle {} is already referenced by a live order",
                input.vehicle_id
            )));
        }
        if !sales_person.role().can_sell() {
            return Err(CommandError::Unauthorized);
        }

        let breakdown = self
            .pricing()
            .calculate_final_price(vehicle.list_price(), input.discount_percentage)?;
        self.pricing()
            .ensure_price_floor(&breakdown.total, vehicle.purchase_price())?;

        let expected = ExpectedVersion::Exact(vehicle.version());
        let reserved = vehicle.reserve(input.occurred_at)?;

        let (mut order, created) = SalesOrder::create(
            input.order_id,
            input.customer_id,
            input.vehicle_id,
            input.sales_person_id,
            breakdown.total,
            input.payment_method,
            input.occurred_at,
        )?;
        let confirmed = order.confirm(input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_SALES_ORDER, &created)?;
        uow.record(input.vehicle_id.0, AGGREGATE_VEHICLE, &reserved)?;
        uow.record(input.order_id.0, AGGREGATE_SALES_ORDER, &confirmed)?;
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected,
        });
        uow.stage(WriteOp::InsertSalesOrder(order));

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(
            order_id = %input.order_id,
            vehicle_id = %input.vehicle_id,
            customer = customer.name(),
            "sales order created, vehicle reserved"
        );
        Ok(input.order_id)
    }

    pub fn start_processing_sales_order(
        &self,
        input: StartProcessingSalesOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_sales_order(input.order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        let event = order.start_processing(input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_SALES_ORDER, &event)?;
        uow.stage(WriteOp::UpdateSalesOrder {
            state: order,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()
    }

    /// Complete the order: the vehicle is sold at the order total.
    pub fn complete_sales_order(
        &self,
        input: CompleteSalesOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_sales_order(input.order_id)?;
        let mut vehicle = self.require_vehicle(order.vehicle_id())?;
        let order_expected = ExpectedVersion::Exact(order.version());
        let vehicle_expected = ExpectedVersion::Exact(vehicle.version());

        let completed = order.complete(input.occurred_at)?;
        let sold = vehicle.mark_sold(order.total().clone(), input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_SALES_ORDER, &completed)?;
        uow.record(order.vehicle_id().0, AGGREGATE_VEHICLE, &sold)?;
        uow.stage(WriteOp::UpdateSalesOrder {
            state: order,
            expected: order_expected,
        });
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected: vehicle_expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %input.order_id, "sales order completed, vehicle sold");
        Ok(())
    }

    /// Cancel the order and release its vehicle back to the lot, atomically.
    pub fn cancel_sales_order(
        &self,
        input: CancelSalesOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_sales_order(input.order_id)?;
        let mut vehicle = self.require_vehicle(order.vehicle_id())?;
        let order_expected = ExpectedVersion::Exact(order.version());
        let vehicle_expected = ExpectedVersion::Exact(vehicle.version());

        let cancelled = order.cancel(input.reason, input.occurred_at)?;
        let released = vehicle.release(input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_SALES_ORDER, &cancelled)?;
        uow.record(order.vehicle_id().0, AGGREGATE_VEHICLE, &released)?;
        uow.stage(WriteOp::UpdateSalesOrder {
            state: order,
            expected: order_expected,
        });
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected: vehicle_expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %input.order_id, "sales order cancelled, vehicle released");
        Ok(())
    }

    pub fn delete_sales_order(
        &self,
        input: DeleteSalesOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_sales_order(input.order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        order.mark_deleted()?;

        let mut uow = self.begin();
        uow.stage(WriteOp::UpdateSalesOrder {
            state: order,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %input.order_id, "sales order soft-deleted");
        Ok(())
    }

    /// Raise a return request against a completed order.
    pub fn create_return_request(
        &self,
        input: CreateReturnRequest,
        cancel: &CancellationToken,
    ) -> Result<ReturnRequestId, CommandError> {
        ensure_not_cancelled(cancel)?;

        let order = self.require_sales_order(input.order_id)?;
        if order.status() != SalesOrderStatus::Completed {
            return Err(CommandError::InvalidStateTransition(format!(
                "returns can only be requested against a completed order, order {} is {}",
                input.order_id,
                order.status()
            )));
        }
        let open_request = self
            .store()
            .requests_for_order(input.order_id)?
            .into_iter()
            .any(|r| r.status() == ReturnRequestStatus::Requested);
        if open_request {
            return Err(CommandError::Validation(format!(
                "order {} already has an open return request",
                input.order_id
            )));
        }

        let (request, requested) = ReturnRequest::create(
            input.request_id,
            input.order_id,
            input.reason,
            input.occurred_at,
        )?;

        let mut uow = self.begin();
        uow.record(input.request_id.0, AGGREGATE_RETURN_REQUEST, &requested)?;
        uow.stage(WriteOp::InsertReturnRequest(request));

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(request_id = %input.request_id, order_id = %input.order_id, "return requested");
        Ok(input.request_id)
    }

    /// Accept a return: the order is refunded and the vehicle comes back as
    /// `Returned`, all in one transaction.
    pub fn accept_return_request(
        &self,
        input: AcceptReturnRequest,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut request = self.require_return_request(input.request_id)?;
        let mut order = self.require_sales_order(request.order_id())?;
        let mut vehicle = self.require_vehicle(order.vehicle_id())?;

        let request_expected = ExpectedVersion::Exact(request.version());
        let order_expected = ExpectedVersion::Exact(order.version());
        let vehicle_expected = ExpectedVersion::Exact(vehicle.version());

        let refund = input
            .refund_amount
            .unwrap_or_else(|| order.total().clone());
        let accepted = request.accept(refund.clone(), input.occurred_at)?;
        let refunded = order.refund(refund, input.occurred_at)?;
        let returned = vehicle.mark_returned(input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.request_id.0, AGGREGATE_RETURN_REQUEST, &accepted)?;
        uow.record(request.order_id().0, AGGREGATE_SALES_ORDER, &refunded)?;
        uow.record(order.vehicle_id().0, AGGREGATE_VEHICLE, &returned)?;
        uow.stage(WriteOp::UpdateReturnRequest {
            state: request,
            expected: request_expected,
        });
        uow.stage(WriteOp::UpdateSalesOrder {
            state: order,
            expected: order_expected,
        });
        uow.stage(WriteOp::UpdateVehicle {
            state: vehicle,
            expected: vehicle_expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(request_id = %input.request_id, "return accepted, order refunded");
        Ok(())
    }

    pub fn reject_return_request(
        &self,
        input: RejectReturnRequest,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut request = self.require_return_request(input.request_id)?;
        let expected = ExpectedVersion::Exact(request.version());
        let rejected = request.reject(input.note, input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.request_id.0, AGGREGATE_RETURN_REQUEST, &rejected)?;
        uow.stage(WriteOp::UpdateReturnRequest {
            state: request,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()
    }
}
