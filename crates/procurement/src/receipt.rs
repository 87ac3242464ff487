use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use motorlot_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money};
use motorlot_events::Event;
use motorlot_vehicles::Vin;

use crate::order::PurchaseOrderId;

/// Goods receipt identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoodsReceiptId(pub AggregateId);

impl GoodsReceiptId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for GoodsReceiptId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Goods receipt status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoodsReceiptStatus {
    Pending,
    Inspected,
    Accepted,
    Rejected,
    Completed,
}

impl GoodsReceiptStatus {
    /// Central transition table. Rejection is legal straight from `Pending`
    /// (damage evident on arrival) as well as after inspection.
    pub fn can_transition(self, to: GoodsReceiptStatus) -> bool {
        use GoodsReceiptStatus::*;
        matches!(
            (self, to),
            (Pending, Inspected)
                | (Pending, Rejected)
                | (Inspected, Accepted)
                | (Inspected, Rejected)
                | (Accepted, Completed)
        )
    }
}

impl core::fmt::Display for GoodsReceiptStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            GoodsReceiptStatus::Pending => "pending",
            GoodsReceiptStatus::Inspected => "inspected",
            GoodsReceiptStatus::Accepted => "accepted",
            GoodsReceiptStatus::Rejected => "rejected",
            GoodsReceiptStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// One arriving vehicle: the attributes to materialize into inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub line_no: u32,
    pub stock_number: String,
    pub vin: Vin,
    pub model_number: String,
    pub brand: String,
    pub purchase_price: Money,
    pub list_price: Money,
}

/// Inspection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub inspector: String,
    pub notes: String,
    pub inspected_at: DateTime<Utc>,
}

/// Aggregate root: GoodsReceipt.
///
/// A receipt that reaches `Accepted` is the only path by which vehicles enter
/// inventory; a rejected receipt materializes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsReceipt {
    id: GoodsReceiptId,
    purchase_order_id: PurchaseOrderId,
    status: GoodsReceiptStatus,
    lines: Vec<ReceiptLine>,
    inspection: Option<Inspection>,
    rejection_reason: Option<String>,
    deleted: bool,
    version: u64,
}

impl GoodsReceipt {
    /// Record arriving stock against a purchase order (`Pending`).
    pub fn create(
        id: GoodsReceiptId,
        purchase_order_id: PurchaseOrderId,
        lines: Vec<ReceiptLine>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<(Self, GoodsReceiptEvent)> {
        if lines.is_empty() {
            return Err(DomainError::validation(
                "a goods receipt needs at least one line",
            ));
        }

        let mut vins: HashSet<&Vin> = HashSet::new();
        for line in &lines {
            if line.stock_number.trim().is_empty() {
                return Err(DomainError::validation("stock number cannot be empty"));
            }
            if line.model_number.trim().is_empty() {
                return Err(DomainError::validation("model number cannot be empty"));
            }
            if line.brand.trim().is_empty() {
                return Err(DomainError::validation("brand cannot be empty"));
            }
            line.purchase_price.ensure_same_currency(&line.list_price)?;
            if line.purchase_price.is_negative() || line.list_price.is_negative() {
                return Err(DomainError::validation("receipt prices cannot be negative"));
            }
            if !vins.insert(&line.vin) {
                return Err(DomainError::validation(format!(
                    "duplicate VIN {} in receipt",
                    line.vin
                )));
            }
        }

        let receipt = Self {
            id,
            purchase_order_id,
            status: GoodsReceiptStatus::Pending,
            lines: lines.clone(),
            inspection: None,
            rejection_reason: None,
            deleted: false,
            version: 1,
        };

        let event = GoodsReceiptEvent::GoodsReceiptCreated(GoodsReceiptCreated {
            receipt_id: id,
            purchase_order_id,
            lines,
            occurred_at,
        });

        Ok((receipt, event))
    }

    pub fn id_typed(&self) -> GoodsReceiptId {
        self.id
    }

    pub fn purchase_order_id(&self) -> PurchaseOrderId {
        self.purchase_order_id
    }

    pub fn status(&self) -> GoodsReceiptStatus {
        self.status
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn inspection(&self) -> Option<&Inspection> {
        self.inspection.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Record the inspection. Legal only while `Pending`.
    pub fn mark_inspected(
        &mut self,
        inspector: impl Into<String>,
        notes: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<GoodsReceiptEvent> {
        self.ensure_active()?;
        let inspector = inspector.into();
        let notes = notes.into();
        if inspector.trim().is_empty() {
            return Err(DomainError::validation("inspector cannot be empty"));
        }
        if self.status != GoodsReceiptStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "cannot inspect goods receipt {} in status {}",
                self.id, self.status
            )));
        }

        self.status = GoodsReceiptStatus::Inspected;
        self.inspection = Some(Inspection {
            inspector: inspector.clone(),
            notes: notes.clone(),
            inspected_at: occurred_at,
        });
        self.touch();

        Ok(GoodsReceiptEvent::GoodsReceiptInspected(
            GoodsReceiptInspected {
                receipt_id: self.id,
                inspector,
                notes,
                occurred_at,
            },
        ))
    }

    /// Accept inspected goods. Legal only from `Inspected`; the caller is
    /// responsible for materializing the vehicles in the same transaction.
    pub fn accept(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<GoodsReceiptEvent> {
        self.ensure_active()?;
        if self.status != GoodsReceiptStatus::Inspected {
            return Err(DomainError::invalid_transition(format!(
                "cannot accept goods receipt {} in status {}",
                self.id, self.status
            )));
        }

        self.status = GoodsReceiptStatus::Accepted;
        self.touch();

        Ok(GoodsReceiptEvent::GoodsReceiptAccepted(
            GoodsReceiptAccepted {
                receipt_id: self.id,
                purchase_order_id: self.purchase_order_id,
                occurred_at,
            },
        ))
    }

    /// Reject arriving goods. Legal from `Pending` or `Inspected`; no vehicle
    /// is ever created from a rejected receipt.
    pub fn reject(
        &mut self,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<GoodsReceiptEvent> {
        self.ensure_active()?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason cannot be empty"));
        }
        if !self.status.can_transition(GoodsReceiptStatus::Rejected) {
            return Err(DomainError::invalid_transition(format!(
                "cannot reject goods receipt {} in status {}",
                self.id, self.status
            )));
        }

        self.status = GoodsReceiptStatus::Rejected;
        self.rejection_reason = Some(reason.clone());
        self.touch();

        Ok(GoodsReceiptEvent::GoodsReceiptRejected(
            GoodsReceiptRejected {
                receipt_id: self.id,
                reason,
                occurred_at,
            },
        ))
    }

    /// Close out an accepted receipt after downstream processing.
    pub fn complete(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<GoodsReceiptEvent> {
        self.ensure_active()?;
        if self.status != GoodsReceiptStatus::Accepted {
            return Err(DomainError::invalid_transition(format!(
                "cannot complete goods receipt {} in status {}",
                self.id, self.status
            )));
        }

        self.status = GoodsReceiptStatus::Completed;
        self.touch();

        Ok(GoodsReceiptEvent::GoodsReceiptCompleted(
            GoodsReceiptCompleted {
                receipt_id: self.id,
                occurred_at,
            },
        ))
    }

    /// Soft delete. Legal only once the receipt is settled.
    pub fn mark_deleted(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        if !matches!(
            self.status,
            GoodsReceiptStatus::Rejected | GoodsReceiptStatus::Completed
        ) {
            return Err(DomainError::invalid_transition(format!(
                "cannot delete goods receipt {} in status {}",
                self.id, self.status
            )));
        }
        self.deleted = true;
        self.touch();
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found(format!(
                "goods receipt {} is deleted",
                self.id
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for GoodsReceipt {
    type Id = GoodsReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: GoodsReceiptCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiptCreated {
    pub receipt_id: GoodsReceiptId,
    pub purchase_order_id: PurchaseOrderId,
    pub lines: Vec<ReceiptLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceiptInspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiptInspected {
    pub receipt_id: GoodsReceiptId,
    pub inspector: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceiptAccepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiptAccepted {
    pub receipt_id: GoodsReceiptId,
    pub purchase_order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceiptRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiptRejected {
    pub receipt_id: GoodsReceiptId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceiptCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiptCompleted {
    pub receipt_id: GoodsReceiptId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoodsReceiptEvent {
    GoodsReceiptCreated(GoodsReceiptCreated),
    GoodsReceiptInspected(GoodsReceiptInspected),
    GoodsReceiptAccepted(GoodsReceiptAccepted),
    GoodsReceiptRejected(GoodsReceiptRejected),
    GoodsReceiptCompleted(GoodsReceiptCompleted),
}

impl Event for GoodsReceiptEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GoodsReceiptEvent::GoodsReceiptCreated(_) => "procurement.goods_receipt.created",
            GoodsReceiptEvent::GoodsReceiptInspected(_) => "procurement.goods_receipt.inspected",
            GoodsReceiptEvent::GoodsReceiptAccepted(_) => "procurement.goods_receipt.accepted",
            GoodsReceiptEvent::GoodsReceiptRejected(_) => "procurement.goods_receipt.rejected",
            GoodsReceiptEvent::GoodsReceiptCompleted(_) => "procurement.goods_receipt.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            GoodsReceiptEvent::GoodsReceiptCreated(e) => e.occurred_at,
            GoodsReceiptEvent::GoodsReceiptInspected(e) => e.occurred_at,
            GoodsReceiptEvent::GoodsReceiptAccepted(e) => e.occurred_at,
            GoodsReceiptEvent::GoodsReceiptRejected(e) => e.occurred_at,
            GoodsReceiptEvent::GoodsReceiptCompleted(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::Currency;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn test_receipt_id() -> GoodsReceiptId {
        GoodsReceiptId::new(AggregateId::new())
    }

    fn test_order_id() -> PurchaseOrderId {
        PurchaseOrderId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn test_line(line_no: u32, vin: &str) -> ReceiptLine {
        ReceiptLine {
            line_no,
            stock_number: format!("LOT-{line_no:04}"),
            vin: Vin::new(vin).unwrap(),
            model_number: "CAMRY-2024".to_string(),
            brand: "Toyota".to_string(),
            purchase_price: usd(dec!(20000)),
            list_price: usd(dec!(23900)),
        }
    }

    fn pending_receipt() -> GoodsReceipt {
        let (receipt, _) = GoodsReceipt::create(
            test_receipt_id(),
            test_order_id(),
            vec![test_line(1, "4T1BF1FK5HU123456")],
            test_time(),
        )
        .unwrap();
        receipt
    }

    #[test]
    fn accept_is_a_failure_unless_inspected() {
        // Pending
        let mut receipt = pending_receipt();
        let err = receipt.accept(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
        assert_eq!(receipt.status(), GoodsReceiptStatus::Pending);

        // Rejected
        let mut receipt = pending_receipt();
        receipt.reject("crushed roof", test_time()).unwrap();
        assert!(receipt.accept(test_time()).is_err());

        // Already accepted
        let mut receipt = pending_receipt();
        receipt
            .mark_inspected("K. Duarte", "clean", test_time())
            .unwrap();
        receipt.accept(test_time()).unwrap();
        assert!(receipt.accept(test_time()).is_err());
    }

    #[test]
    fn inspect_then_accept_happy_path() {
        let mut receipt = pending_receipt();

        let event = receipt
            .mark_inspected("K. Duarte", "paint scratch on door", test_time())
            .unwrap();
        assert_eq!(receipt.status(), GoodsReceiptStatus::Inspected);
        match event {
            GoodsReceiptEvent::GoodsReceiptInspected(e) => {
                assert_eq!(e.inspector, "K. Duarte");
            }
            _ => panic!("Expected GoodsReceiptInspected event"),
        }

        receipt.accept(test_time()).unwrap();
        assert_eq!(receipt.status(), GoodsReceiptStatus::Accepted);

        receipt.complete(test_time()).unwrap();
        assert_eq!(receipt.status(), GoodsReceiptStatus::Completed);
    }

    #[test]
    fn rejection_is_legal_straight_from_pending() {
        let mut receipt = pending_receipt();
        let event = receipt.reject("damaged in transit", test_time()).unwrap();

        assert_eq!(receipt.status(), GoodsReceiptStatus::Rejected);
        assert_eq!(receipt.rejection_reason(), Some("damaged in transit"));
        match event {
            GoodsReceiptEvent::GoodsReceiptRejected(e) => {
                assert_eq!(e.reason, "damaged in transit");
            }
            _ => panic!("Expected GoodsReceiptRejected event"),
        }
    }

    #[test]
    fn rejection_is_also_legal_after_inspection() {
        let mut receipt = pending_receipt();
        receipt
            .mark_inspected("K. Duarte", "frame damage", test_time())
            .unwrap();
        receipt.reject("failed inspection", test_time()).unwrap();
        assert_eq!(receipt.status(), GoodsReceiptStatus::Rejected);
    }

    #[test]
    fn inspect_is_legal_only_from_pending() {
        let mut receipt = pending_receipt();
        receipt
            .mark_inspected("K. Duarte", "clean", test_time())
            .unwrap();

        let err = receipt
            .mark_inspected("K. Duarte", "again", test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn receipt_requires_lines_and_unique_vins() {
        assert!(GoodsReceipt::create(test_receipt_id(), test_order_id(), vec![], test_time())
            .is_err());

        let duplicate = GoodsReceipt::create(
            test_receipt_id(),
            test_order_id(),
            vec![
                test_line(1, "4T1BF1FK5HU123456"),
                test_line(2, "4T1BF1FK5HU123456"),
            ],
            test_time(),
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn settled_receipts_can_be_deleted_in_flight_ones_cannot() {
        let mut receipt = pending_receipt();
        assert!(receipt.mark_deleted().is_err());

        receipt.reject("damaged in transit", test_time()).unwrap();
        assert!(receipt.mark_deleted().is_ok());
        assert!(receipt.is_deleted());
    }
}
