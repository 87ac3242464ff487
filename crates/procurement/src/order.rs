use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use motorlot_core::{AggregateId, AggregateRoot, Currency, DomainError, DomainResult, Money};
use motorlot_events::Event;

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supplier identifier (suppliers are managed outside this repository).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(pub AggregateId);

impl SupplierId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Submitted,
    Approved,
    Sent,
    Received,
    Completed,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Central transition table.
    pub fn can_transition(self, to: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, to),
            (Draft, Submitted)
                | (Draft, Cancelled)
                | (Submitted, Approved)
                | (Submitted, Cancelled)
                | (Approved, Sent)
                | (Approved, Cancelled)
                | (Sent, Received)
                | (Sent, Cancelled)
                | (Received, Completed)
        )
    }
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Submitted => "submitted",
            PurchaseOrderStatus::Approved => "approved",
            PurchaseOrderStatus::Sent => "sent",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Completed => "completed",
            PurchaseOrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub line_no: u32,
    pub model_number: String,
    pub brand: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    supplier_id: SupplierId,
    status: PurchaseOrderStatus,
    currency: Currency,
    lines: Vec<PurchaseOrderLine>,
    /// Always recomputed from the lines, never hand-set.
    total_amount: Money,
    cancellation_reason: Option<String>,
    deleted: bool,
    version: u64,
}

impl PurchaseOrder {
    /// Open a new draft order with the supplier, in a single currency.
    pub fn create(
        id: PurchaseOrderId,
        supplier_id: SupplierId,
        currency: Currency,
        occurred_at: DateTime<Utc>,
    ) -> (Self, PurchaseOrderEvent) {
        let order = Self {
            id,
            supplier_id,
            status: PurchaseOrderStatus::Draft,
            currency: currency.clone(),
            lines: Vec::new(),
            total_amount: Money::zero(currency.clone()),
            cancellation_reason: None,
            deleted: false,
            version: 1,
        };

        let event = PurchaseOrderEvent::PurchaseOrderCreated(PurchaseOrderCreated {
            order_id: id,
            supplier_id,
            currency,
            occurred_at,
        });

        (order, event)
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn lines(&self) -> &[PurchaseOrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> &Money {
        &self.total_amount
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Line mutations are allowed while the order is still negotiable.
    pub fn can_be_modified(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Submitted
        )
    }

    /// Cancellation is allowed until goods have been received.
    pub fn can_be_cancelled(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Draft
                | PurchaseOrderStatus::Submitted
                | PurchaseOrderStatus::Approved
                | PurchaseOrderStatus::Sent
        )
    }

    pub fn can_be_deleted(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled
        )
    }

    pub fn add_line(
        &mut self,
        model_number: impl Into<String>,
        brand: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.ensure_active()?;
        self.ensure_modifiable("add a line to")?;

        let model_number = model_number.into();
        let brand = brand.into();
        if model_number.trim().is_empty() {
            return Err(DomainError::validation("model number cannot be empty"));
        }
        if brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if unit_price.currency() != &self.currency {
            return Err(DomainError::validation(format!(
                "line currency {} does not match order currency {}",
                unit_price.currency(),
                self.currency
            )));
        }

        let line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        self.lines.push(PurchaseOrderLine {
            line_no,
            model_number: model_number.clone(),
            brand: brand.clone(),
            unit_price: unit_price.clone(),
            quantity,
        });
        self.recompute_total()?;
        self.touch();

        Ok(PurchaseOrderEvent::PurchaseOrderLineAdded(
            PurchaseOrderLineAdded {
                order_id: self.id,
                line_no,
                model_number,
                brand,
                unit_price,
                quantity,
                occurred_at,
            },
        ))
    }

    pub fn update_line_quantity(
        &mut self,
        line_no: u32,
        quantity: u32,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.ensure_active()?;
        self.ensure_modifiable("update a line of")?;

        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| {
                DomainError::validation(format!("purchase order has no line {line_no}"))
            })?;
        line.quantity = quantity;
        self.recompute_total()?;
        self.touch();

        Ok(PurchaseOrderEvent::PurchaseOrderLineUpdated(
            PurchaseOrderLineUpdated {
                order_id: self.id,
                line_no,
                quantity,
                occurred_at,
            },
        ))
    }

    pub fn remove_line(
        &mut self,
        line_no: u32,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.ensure_active()?;
        self.ensure_modifiable("remove a line from")?;

        let before = self.lines.len();
        self.lines.retain(|l| l.line_no != line_no);
        if self.lines.len() == before {
            return Err(DomainError::validation(format!(
                "purchase order has no line {line_no}"
            )));
        }
        self.recompute_total()?;
        self.touch();

        Ok(PurchaseOrderEvent::PurchaseOrderLineRemoved(
            PurchaseOrderLineRemoved {
                order_id: self.id,
                line_no,
                occurred_at,
            },
        ))
    }

    pub fn submit(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<PurchaseOrderEvent> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot submit a purchase order without lines",
            ));
        }
        self.transition_to(PurchaseOrderStatus::Submitted, occurred_at)
    }

    /// Approval is legal only for a submitted order.
    pub fn approve(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<PurchaseOrderEvent> {
        self.transition_to(PurchaseOrderStatus::Approved, occurred_at)
    }

    pub fn mark_sent(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<PurchaseOrderEvent> {
        self.transition_to(PurchaseOrderStatus::Sent, occurred_at)
    }

    pub fn mark_received(
        &mut self,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.transition_to(PurchaseOrderStatus::Received, occurred_at)
    }

    pub fn complete(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<PurchaseOrderEvent> {
        self.transition_to(PurchaseOrderStatus::Completed, occurred_at)
    }

    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.ensure_active()?;
        if !self.can_be_cancelled() {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel purchase order {} in status {}",
                self.id, self.status
            )));
        }

        let reason = reason.into();
        self.status = PurchaseOrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.clone());
        self.touch();

        Ok(PurchaseOrderEvent::PurchaseOrderCancelled(
            PurchaseOrderCancelled {
                order_id: self.id,
                reason,
                occurred_at,
            },
        ))
    }

    /// Soft delete. Orders are never hard-deleted (audit history).
    pub fn mark_deleted(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        if !self.can_be_deleted() {
            return Err(DomainError::invalid_transition(format!(
                "cannot delete purchase order {} in status {}",
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
                "purchase order {} is deleted",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_modifiable(&self, operation: &str) -> DomainResult<()> {
        if !self.can_be_modified() {
            return Err(DomainError::invalid_transition(format!(
                "cannot {operation} purchase order {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn transition_to(
        &mut self,
        to: PurchaseOrderStatus,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrderEvent> {
        self.ensure_active()?;
        if !self.status.can_transition(to) {
            return Err(DomainError::invalid_transition(format!(
                "purchase order {}: {} -> {}",
                self.id, self.status, to
            )));
        }

        let from = self.status;
        self.status = to;
        self.touch();

        Ok(PurchaseOrderEvent::PurchaseOrderStatusChanged(
            PurchaseOrderStatusChanged {
                order_id: self.id,
                from,
                to,
                occurred_at,
            },
        ))
    }

    fn recompute_total(&mut self) -> DomainResult<()> {
        let mut total = Money::zero(self.currency.clone());
        for line in &self.lines {
            total = total.add(&line.unit_price.multiply(Decimal::from(line.quantity))?)?;
        }
        self.total_amount = total;
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineAdded {
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub model_number: String,
    pub brand: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineUpdated {
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineRemoved {
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderStatusChanged {
    pub order_id: PurchaseOrderId,
    pub from: PurchaseOrderStatus,
    pub to: PurchaseOrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCancelled {
    pub order_id: PurchaseOrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderLineAdded(PurchaseOrderLineAdded),
    PurchaseOrderLineUpdated(PurchaseOrderLineUpdated),
    PurchaseOrderLineRemoved(PurchaseOrderLineRemoved),
    PurchaseOrderStatusChanged(PurchaseOrderStatusChanged),
    PurchaseOrderCancelled(PurchaseOrderCancelled),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "procurement.purchase_order.created",
            PurchaseOrderEvent::PurchaseOrderLineAdded(_) => {
                "procurement.purchase_order.line_added"
            }
            PurchaseOrderEvent::PurchaseOrderLineUpdated(_) => {
                "procurement.purchase_order.line_updated"
            }
            PurchaseOrderEvent::PurchaseOrderLineRemoved(_) => {
                "procurement.purchase_order.line_removed"
            }
            PurchaseOrderEvent::PurchaseOrderStatusChanged(_) => {
                "procurement.purchase_order.status_changed"
            }
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => {
                "procurement.purchase_order.cancelled"
            }
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineUpdated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineRemoved(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderStatusChanged(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderCancelled(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_order_id() -> PurchaseOrderId {
        PurchaseOrderId::new(AggregateId::new())
    }

    fn test_supplier_id() -> SupplierId {
        SupplierId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn draft_order() -> PurchaseOrder {
        let (order, _) = PurchaseOrder::create(
            test_order_id(),
            test_supplier_id(),
            Currency::usd(),
            test_time(),
        );
        order
    }

    #[test]
    fn one_line_total_is_price_times_quantity() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 3, test_time())
            .unwrap();

        assert_eq!(order.total_amount(), &usd(dec!(60000)));
    }

    #[test]
    fn total_is_recomputed_after_every_line_mutation() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 3, test_time())
            .unwrap();
        order
            .add_line("CIVIC-2024", "Honda", usd(dec!(18000)), 2, test_time())
            .unwrap();
        assert_eq!(order.total_amount(), &usd(dec!(96000)));

        order.update_line_quantity(1, 1, test_time()).unwrap();
        assert_eq!(order.total_amount(), &usd(dec!(56000)));

        order.remove_line(2, test_time()).unwrap();
        assert_eq!(order.total_amount(), &usd(dec!(20000)));
    }

    #[test]
    fn approve_is_legal_only_from_submitted() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 1, test_time())
            .unwrap();

        let err = order.approve(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));

        order.submit(test_time()).unwrap();
        order.approve(test_time()).unwrap();
        assert_eq!(order.status(), PurchaseOrderStatus::Approved);
    }

    #[test]
    fn submit_requires_at_least_one_line() {
        let mut order = draft_order();
        let err = order.submit(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lines_are_frozen_after_approval() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 1, test_time())
            .unwrap();
        order.submit(test_time()).unwrap();

        // Still modifiable while submitted.
        order
            .add_line("CIVIC-2024", "Honda", usd(dec!(18000)), 1, test_time())
            .unwrap();

        order.approve(test_time()).unwrap();
        let err = order
            .add_line("RAV4-2024", "Toyota", usd(dec!(26000)), 1, test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn cancellation_window_closes_once_goods_are_received() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 1, test_time())
            .unwrap();
        order.submit(test_time()).unwrap();
        order.approve(test_time()).unwrap();
        order.mark_sent(test_time()).unwrap();
        assert!(order.can_be_cancelled());

        order.mark_received(test_time()).unwrap();
        assert!(!order.can_be_cancelled());
        let err = order.cancel("supplier delay", test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn cancel_records_the_reason() {
        let mut order = draft_order();
        order.cancel("duplicate order", test_time()).unwrap();
        assert_eq!(order.status(), PurchaseOrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some("duplicate order"));
    }

    #[test]
    fn line_currency_must_match_order_currency() {
        let mut order = draft_order();
        let err = order
            .add_line(
                "CAMRY-2024",
                "Toyota",
                Money::new(dec!(20000), Currency::eur()),
                1,
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deleted_orders_reject_mutations() {
        let mut order = draft_order();
        order.mark_deleted().unwrap();
        let err = order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 1, test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(_)));
    }

    #[test]
    fn delete_is_blocked_while_in_flight() {
        let mut order = draft_order();
        order
            .add_line("CAMRY-2024", "Toyota", usd(dec!(20000)), 1, test_time())
            .unwrap();
        order.submit(test_time()).unwrap();

        let err = order.mark_deleted().unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of line mutations,
        /// `total_amount == Σ(line price × quantity)`.
        #[test]
        fn total_always_equals_sum_of_lines(
            ops in prop::collection::vec(
                prop_oneof![
                    (1u32..50_000u32, 1u32..10u32).prop_map(|(price, qty)| (0u8, price, qty)),
                    (1u32..20u32, 1u32..10u32).prop_map(|(line, qty)| (1u8, line, qty)),
                    (1u32..20u32).prop_map(|line| (2u8, line, 0u32)),
                ],
                1..30,
            )
        ) {
            let mut order = draft_order();

            for (kind, a, b) in ops {
                let _ = match kind {
                    0 => order.add_line("MODEL-X", "Acme", usd(Decimal::from(a)), b, test_time()),
                    1 => order.update_line_quantity(a, b, test_time()),
                    _ => order.remove_line(a, test_time()),
                };

                let expected = order.lines().iter().fold(Decimal::ZERO, |acc, l| {
                    acc + l.unit_price.amount() * Decimal::from(l.quantity)
                });
                prop_assert_eq!(order.total_amount().amount(), expected);
            }
        }
    }
}
