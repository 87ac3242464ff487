//! Procurement commands: purchase orders and goods receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use motorlot_core::{AggregateId, AggregateRoot, Currency, DomainResult, ExpectedVersion, Money};
use motorlot_events::{EventBus, EventEnvelope};
use motorlot_procurement::{
    GoodsReceipt, GoodsReceiptEvent, GoodsReceiptId, PurchaseOrder, PurchaseOrderEvent,
    PurchaseOrderId, ReceiptLine, SupplierId,
};
use motorlot_vehicles::{Vehicle, VehicleId, Vin};

use crate::cancel::CancellationToken;
use crate::store::{DealershipStore, WriteOp};

use super::{
    AGGREGATE_GOODS_RECEIPT, AGGREGATE_PURCHASE_ORDER, AGGREGATE_VEHICLE, CommandError,
    Dealership, ensure_not_cancelled,
};

/// One purchase order line, as requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub model_number: String,
    pub brand: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// Command: CreatePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub currency: Currency,
    pub lines: Vec<NewOrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddPurchaseOrderLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPurchaseOrderLine {
    pub order_id: PurchaseOrderId,
    pub line: NewOrderLine,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApprovePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovePurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkPurchaseOrderSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPurchaseOrderSent {
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// One arriving vehicle, as reported by the receiving dock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReceiptLine {
    pub stock_number: String,
    pub vin: Vin,
    pub model_number: String,
    pub brand: String,
    pub purchase_price: Money,
    pub list_price: Money,
}

/// Command: ReceivePurchaseOrder.
///
/// Marks the order received and opens a `Pending` goods receipt for the
/// arriving stock, atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivePurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub receipt_id: GoodsReceiptId,
    pub lines: Vec<NewReceiptLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompletePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelPurchaseOrder {
    pub order_id: PurchaseOrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeletePurchaseOrder (soft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePurchaseOrder {
    pub order_id: PurchaseOrderId,
}

/// Command: InspectGoodsReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectGoodsReceipt {
    pub receipt_id: GoodsReceiptId,
    pub inspector: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AcceptGoodsReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptGoodsReceipt {
    pub receipt_id: GoodsReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectGoodsReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectGoodsReceipt {
    pub receipt_id: GoodsReceiptId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteGoodsReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteGoodsReceipt {
    pub receipt_id: GoodsReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteGoodsReceipt (soft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteGoodsReceipt {
    pub receipt_id: GoodsReceiptId,
}

impl<S, B> Dealership<S, B>
where
    S: DealershipStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_purchase_order(
        &self,
        input: CreatePurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<PurchaseOrderId, CommandError> {
        ensure_not_cancelled(cancel)?;

        let (mut order, created) = PurchaseOrder::create(
            input.order_id,
            input.supplier_id,
            input.currency,
            input.occurred_at,
        );

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_PURCHASE_ORDER, &created)?;
        for line in input.lines {
            let added = order.add_line(
                line.model_number,
                line.brand,
                line.unit_price,
                line.quantity,
                input.occurred_at,
            )?;
            uow.record(input.order_id.0, AGGREGATE_PURCHASE_ORDER, &added)?;
        }
        uow.stage(WriteOp::InsertPurchaseOrder(order));

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %input.order_id, "purchase order created");
        Ok(input.order_id)
    }

    pub fn add_purchase_order_line(
        &self,
        input: AddPurchaseOrderLine,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        let line = input.line;
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.add_line(
                line.model_number,
                line.brand,
                line.unit_price,
                line.quantity,
                input.occurred_at,
            )
        })
    }

    pub fn submit_purchase_order(
        &self,
        input: SubmitPurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.submit(input.occurred_at)
        })
    }

    pub fn approve_purchase_order(
        &self,
        input: ApprovePurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.approve(input.occurred_at)
        })
    }

    pub fn mark_purchase_order_sent(
        &self,
        input: MarkPurchaseOrderSent,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.mark_sent(input.occurred_at)
        })
    }

    /// Receive a sent purchase order: the order moves to `Received` and a
    /// `Pending` goods receipt is opened for the arriving stock, in one
    /// transaction.
    pub fn receive_purchase_order(
        &self,
        input: ReceivePurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<GoodsReceiptId, CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_purchase_order(input.order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        let received = order.mark_received(input.occurred_at)?;

        let lines = input
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, l)| ReceiptLine {
                line_no: (idx as u32) + 1,
                stock_number: l.stock_number,
                vin: l.vin,
                model_number: l.model_number,
                brand: l.brand,
                purchase_price: l.purchase_price,
                list_price: l.list_price,
            })
            .collect();
        let (receipt, opened) =
            GoodsReceipt::create(input.receipt_id, input.order_id, lines, input.occurred_at)?;

        let mut uow = self.begin();
        uow.record(input.order_id.0, AGGREGATE_PURCHASE_ORDER, &received)?;
        uow.record(input.receipt_id.0, AGGREGATE_GOODS_RECEIPT, &opened)?;
        uow.stage(WriteOp::UpdatePurchaseOrder {
            state: order,
            expected,
        });
        uow.stage(WriteOp::InsertGoodsReceipt(receipt));

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(
            order_id = %input.order_id,
            receipt_id = %input.receipt_id,
            "purchase order received, goods receipt opened"
        );
        Ok(input.receipt_id)
    }

    pub fn complete_purchase_order(
        &self,
        input: CompletePurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.complete(input.occurred_at)
        })
    }

    pub fn cancel_purchase_order(
        &self,
        input: CancelPurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_purchase_order(input.order_id, cancel, |order| {
            order.cancel(input.reason, input.occurred_at)
        })
    }

    pub fn delete_purchase_order(
        &self,
        input: DeletePurchaseOrder,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_purchase_order(input.order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        order.mark_deleted()?;

        let mut uow = self.begin();
        uow.stage(WriteOp::UpdatePurchaseOrder {
            state: order,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %input.order_id, "purchase order soft-deleted");
        Ok(())
    }

    pub fn inspect_goods_receipt(
        &self,
        input: InspectGoodsReceipt,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_goods_receipt(input.receipt_id, cancel, |receipt| {
            receipt.mark_inspected(input.inspector, input.notes, input.occurred_at)
        })
    }

    /// Accept an inspected receipt and materialize its vehicles.
    ///
    /// The receipt status change and every vehicle creation commit together;
    /// a VIN collision fails the whole command and nothing enters inventory.
    pub fn accept_goods_receipt(
        &self,
        input: AcceptGoodsReceipt,
        cancel: &CancellationToken,
    ) -> Result<Vec<VehicleId>, CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut receipt = self.require_goods_receipt(input.receipt_id)?;
        let expected = ExpectedVersion::Exact(receipt.version());
        let accepted = receipt.accept(input.occurred_at)?;
        let lines = receipt.lines().to_vec();

        let mut uow = self.begin();
        uow.record(input.receipt_id.0, AGGREGATE_GOODS_RECEIPT, &accepted)?;

        let mut vehicle_ids = Vec::with_capacity(lines.len());
        for line in lines {
            if self.store().vehicle_by_vin(&line.vin)?.is_some() {
                return Err(CommandError::Conflict(format!(
                    "a vehicle with VIN {} already exists",
                    line.vin
                )));
            }

            let vehicle_id = VehicleId::new(AggregateId::new());
            let (vehicle, created) = Vehicle::new(
                vehicle_id,
                line.stock_number,
                line.vin,
                line.model_number,
                line.brand,
                line.purchase_price,
                line.list_price,
                input.occurred_at,
            )?;
            uow.record(vehicle_id.0, AGGREGATE_VEHICLE, &created)?;
            uow.stage(WriteOp::InsertVehicle(vehicle));
            vehicle_ids.push(vehicle_id);
        }

        uow.stage(WriteOp::UpdateGoodsReceipt {
            state: receipt,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(
            receipt_id = %input.receipt_id,
            vehicles = vehicle_ids.len(),
            "goods receipt accepted, vehicles entered inventory"
        );
        Ok(vehicle_ids)
    }

    pub fn reject_goods_receipt(
        &self,
        input: RejectGoodsReceipt,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_goods_receipt(input.receipt_id, cancel, |receipt| {
            receipt.reject(input.reason, input.occurred_at)
        })
    }

    pub fn complete_goods_receipt(
        &self,
        input: CompleteGoodsReceipt,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        self.mutate_goods_receipt(input.receipt_id, cancel, |receipt| {
            receipt.complete(input.occurred_at)
        })
    }

    pub fn delete_goods_receipt(
        &self,
        input: DeleteGoodsReceipt,
        cancel: &CancellationToken,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut receipt = self.require_goods_receipt(input.receipt_id)?;
        let expected = ExpectedVersion::Exact(receipt.version());
        receipt.mark_deleted()?;

        let mut uow = self.begin();
        uow.stage(WriteOp::UpdateGoodsReceipt {
            state: receipt,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(receipt_id = %input.receipt_id, "goods receipt soft-deleted");
        Ok(())
    }

    /// Load-mutate-commit cycle for a single purchase order.
    fn mutate_purchase_order(
        &self,
        order_id: PurchaseOrderId,
        cancel: &CancellationToken,
        mutate: impl FnOnce(&mut PurchaseOrder) -> DomainResult<PurchaseOrderEvent>,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut order = self.require_purchase_order(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        let event = mutate(&mut order)?;

        let mut uow = self.begin();
        uow.record(order_id.0, AGGREGATE_PURCHASE_ORDER, &event)?;
        uow.stage(WriteOp::UpdatePurchaseOrder {
            state: order,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(order_id = %order_id, "purchase order updated");
        Ok(())
    }

    /// Load-mutate-commit cycle for a single goods receipt.
    fn mutate_goods_receipt(
        &self,
        receipt_id: GoodsReceiptId,
        cancel: &CancellationToken,
        mutate: impl FnOnce(&mut GoodsReceipt) -> DomainResult<GoodsReceiptEvent>,
    ) -> Result<(), CommandError> {
        ensure_not_cancelled(cancel)?;

        let mut receipt = self.require_goods_receipt(receipt_id)?;
        let expected = ExpectedVersion::Exact(receipt.version());
        let event = mutate(&mut receipt)?;

        let mut uow = self.begin();
        uow.record(receipt_id.0, AGGREGATE_GOODS_RECEIPT, &event)?;
        uow.stage(WriteOp::UpdateGoodsReceipt {
            state: receipt,
            expected,
        });

        ensure_not_cancelled(cancel)?;
        uow.commit()?;

        tracing::info!(receipt_id = %receipt_id, "goods receipt updated");
        Ok(())
    }
}
