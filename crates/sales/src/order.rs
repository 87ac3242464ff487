use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorlot_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money};
use motorlot_events::Event;
use motorlot_parties::{CustomerId, EmployeeId};
use motorlot_vehicles::VehicleId;

/// Sales order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Payment method, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Financing,
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Pending,
    Confirmed,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl SalesOrderStatus {
    /// Central transition table.
    pub fn can_transition(self, to: SalesOrderStatus) -> bool {
        use SalesOrderStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }
}

impl core::fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SalesOrderStatus::Pending => "pending",
            SalesOrderStatus::Confirmed => "confirmed",
            SalesOrderStatus::Processing => "processing",
            SalesOrderStatus::Completed => "completed",
            SalesOrderStatus::Cancelled => "cancelled",
            SalesOrderStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// Aggregate root: SalesOrder.
///
/// An order references a vehicle only while that vehicle is reserved or sold
/// on its behalf; cancellation must release the vehicle (the command handler
/// does both in one transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    customer_id: CustomerId,
    vehicle_id: VehicleId,
    sales_person_id: EmployeeId,
    status: SalesOrderStatus,
    total: Money,
    payment_method: PaymentMethod,
    ordered_at: DateTime<Utc>,
    cancellation_reason: Option<String>,
    refund_amount: Option<Money>,
    deleted: bool,
    version: u64,
}

impl SalesOrder {
    /// Open a new order (`Pending`). The handler confirms it in the same
    /// transaction that reserves the vehicle.
    pub fn create(
        id: SalesOrderId,
        customer_id: CustomerId,
        vehicle_id: VehicleId,
        sales_person_id: EmployeeId,
        total: Money,
        payment_method: PaymentMethod,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<(Self, SalesOrderEvent)> {
        if total.is_negative() {
            return Err(DomainError::validation("order total cannot be negative"));
        }

        let order = Self {
            id,
            customer_id,
            vehicle_id,
            sales_person_id,
            status: SalesOrderStatus::Pending,
            total: total.clone(),
            payment_method,
            ordered_at,
            cancellation_reason: None,
            refund_amount: None,
            deleted: false,
            version: 1,
        };

        let event = SalesOrderEvent::OrderCreated(OrderCreated {
            order_id: id,
            customer_id,
            vehicle_id,
            sales_person_id,
            total,
            payment_method,
            occurred_at: ordered_at,
        });

        Ok((order, event))
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn sales_person_id(&self) -> EmployeeId {
        self.sales_person_id
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn refund_amount(&self) -> Option<&Money> {
        self.refund_amount.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The order still holds a reservation on its vehicle.
    pub fn is_live(&self) -> bool {
        !self.deleted
            && matches!(
                self.status,
                SalesOrderStatus::Pending
                    | SalesOrderStatus::Confirmed
                    | SalesOrderStatus::Processing
            )
    }

    pub fn confirm(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<SalesOrderEvent> {
        self.transition_to(SalesOrderStatus::Confirmed, occurred_at)
    }

    pub fn start_processing(
        &mut self,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<SalesOrderEvent> {
        self.transition_to(SalesOrderStatus::Processing, occurred_at)
    }

    /// Complete the sale. The handler marks the vehicle sold in the same
    /// transaction.
    pub fn complete(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<SalesOrderEvent> {
        self.ensure_active()?;
        if !matches!(
            self.status,
            SalesOrderStatus::Confirmed | SalesOrderStatus::Processing
        ) {
            return Err(DomainError::invalid_transition(format!(
                "cannot complete sales order {} in status {}",
                self.id, self.status
            )));
        }

        self.status = SalesOrderStatus::Completed;
        self.touch();

        Ok(SalesOrderEvent::OrderCompleted(OrderCompleted {
            order_id: self.id,
            vehicle_id: self.vehicle_id,
            total: self.total.clone(),
            occurred_at,
        }))
    }

    /// Cancel the order. The handler releases the vehicle in the same
    /// transaction.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<SalesOrderEvent> {
        self.ensure_active()?;
        if !self.status.can_transition(SalesOrderStatus::Cancelled) {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel sales order {} in status {}",
                self.id, self.status
            )));
        }

        let reason = reason.into();
        self.status = SalesOrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.clone());
        self.touch();

        Ok(SalesOrderEvent::OrderCancelled(OrderCancelled {
            order_id: self.id,
            vehicle_id: self.vehicle_id,
            reason,
            occurred_at,
        }))
    }

    /// Record the refund of a completed order (accepted return request).
    pub fn refund(
        &mut self,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<SalesOrderEvent> {
        self.ensure_active()?;
        if self.status != SalesOrderStatus::Completed {
            return Err(DomainError::invalid_transition(format!(
                "cannot refund sales order {} in status {}",
                self.id, self.status
            )));
        }
        if amount.is_negative() {
            return Err(DomainError::validation("refund amount cannot be negative"));
        }
        if amount.gt(&self.total)? {
            return Err(DomainError::validation(
                "refund amount cannot exceed the order total",
            ));
        }

        self.status = SalesOrderStatus::Refunded;
        self.refund_amount = Some(amount.clone());
        self.touch();

        Ok(SalesOrderEvent::OrderRefunded(OrderRefunded {
            order_id: self.id,
            vehicle_id: self.vehicle_id,
            refund_amount: amount,
            occurred_at,
        }))
    }

    /// Soft delete. Legal only once the order is settled.
    pub fn mark_deleted(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        if !matches!(
            self.status,
            SalesOrderStatus::Cancelled | SalesOrderStatus::Refunded
        ) {
            return Err(DomainError::invalid_transition(format!(
                "cannot delete sales order {} in status {}",
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
                "sales order {} is deleted",
                self.id
            )));
        }
        Ok(())
    }

    fn transition_to(
        &mut self,
        to: SalesOrderStatus,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<SalesOrderEvent> {
        self.ensure_active()?;
        if !self.status.can_transition(to) {
            return Err(DomainError::invalid_transition(format!(
                "sales order {}: {} -> {}",
                self.id, self.status, to
            )));
        }

        let from = self.status;
        self.status = to;
        self.touch();

        Ok(SalesOrderEvent::OrderStatusChanged(OrderStatusChanged {
            order_id: self.id,
            from,
            to,
            occurred_at,
        }))
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub sales_person_id: EmployeeId,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: SalesOrderId,
    pub from: SalesOrderStatus,
    pub to: SalesOrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub order_id: SalesOrderId,
    pub vehicle_id: VehicleId,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: SalesOrderId,
    pub vehicle_id: VehicleId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderRefunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefunded {
    pub order_id: SalesOrderId,
    pub vehicle_id: VehicleId,
    pub refund_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    OrderCreated(OrderCreated),
    OrderStatusChanged(OrderStatusChanged),
    OrderCompleted(OrderCompleted),
    OrderCancelled(OrderCancelled),
    OrderRefunded(OrderRefunded),
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::OrderCreated(_) => "sales.order.created",
            SalesOrderEvent::OrderStatusChanged(_) => "sales.order.status_changed",
            SalesOrderEvent::OrderCompleted(_) => "sales.order.completed",
            SalesOrderEvent::OrderCancelled(_) => "sales.order.cancelled",
            SalesOrderEvent::OrderRefunded(_) => "sales.order.refunded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::OrderCreated(e) => e.occurred_at,
            SalesOrderEvent::OrderStatusChanged(e) => e.occurred_at,
            SalesOrderEvent::OrderCompleted(e) => e.occurred_at,
            SalesOrderEvent::OrderCancelled(e) => e.occurred_at,
            SalesOrderEvent::OrderRefunded(e) => e.occurred_at,
        }
    }
}
