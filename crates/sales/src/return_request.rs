use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorlot_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money};
use motorlot_events::Event;

use crate::order::SalesOrderId;

/// Return request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnRequestId(pub AggregateId);

impl ReturnRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReturnRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Return request status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnRequestStatus {
    Requested,
    Accepted,
    Rejected,
}

impl core::fmt::Display for ReturnRequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReturnRequestStatus::Requested => "requested",
            ReturnRequestStatus::Accepted => "accepted",
            ReturnRequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Aggregate root: ReturnRequest.
///
/// Raised against a completed sales order. Acceptance drives the vehicle to
/// `Returned` and the order to `Refunded` (the command handler does all three
/// in one transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnRequest {
    id: ReturnRequestId,
    order_id: SalesOrderId,
    reason: String,
    status: ReturnRequestStatus,
    refund_amount: Option<Money>,
    requested_at: DateTime<Utc>,
    version: u64,
}

impl ReturnRequest {
    pub fn create(
        id: ReturnRequestId,
        order_id: SalesOrderId,
        reason: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> DomainResult<(Self, ReturnRequestEvent)> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("return reason cannot be empty"));
        }

        let request = Self {
            id,
            order_id,
            reason: reason.clone(),
            status: ReturnRequestStatus::Requested,
            refund_amount: None,
            requested_at,
            version: 1,
        };

        let event = ReturnRequestEvent::ReturnRequested(ReturnRequested {
            request_id: id,
            order_id,
            reason,
            occurred_at: requested_at,
        });

        Ok((request, event))
    }

    pub fn id_typed(&self) -> ReturnRequestId {
        self.id
    }

    pub fn order_id(&self) -> SalesOrderId {
        self.order_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> ReturnRequestStatus {
        self.status
    }

    pub fn refund_amount(&self) -> Option<&Money> {
        self.refund_amount.as_ref()
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Accept the return, recording the refund that was granted.
    pub fn accept(
        &mut self,
        refund_amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ReturnRequestEvent> {
        self.ensure_open("accept")?;
        if refund_amount.is_negative() {
            return Err(DomainError::validation("refund amount cannot be negative"));
        }

        self.status = ReturnRequestStatus::Accepted;
        self.refund_amount = Some(refund_amount.clone());
        self.touch();

        Ok(ReturnRequestEvent::ReturnAccepted(ReturnAccepted {
            request_id: self.id,
            order_id: self.order_id,
            refund_amount,
            occurred_at,
        }))
    }

    pub fn reject(
        &mut self,
        note: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ReturnRequestEvent> {
        self.ensure_open("reject")?;

        self.status = ReturnRequestStatus::Rejected;
        self.touch();

        Ok(ReturnRequestEvent::ReturnRejected(ReturnRejected {
            request_id: self.id,
            order_id: self.order_id,
            note: note.into(),
            occurred_at,
        }))
    }

    fn ensure_open(&self, operation: &str) -> DomainResult<()> {
        if self.status != ReturnRequestStatus::Requested {
            return Err(DomainError::invalid_transition(format!(
                "cannot {operation} return request {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for ReturnRequest {
    type Id = ReturnRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: ReturnRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequested {
    pub request_id: ReturnRequestId,
    pub order_id: SalesOrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReturnAccepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnAccepted {
    pub request_id: ReturnRequestId,
    pub order_id: SalesOrderId,
    pub refund_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReturnRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRejected {
    pub request_id: ReturnRequestId,
    pub order_id: SalesOrderId,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnRequestEvent {
    ReturnRequested(ReturnRequested),
    ReturnAccepted(ReturnAccepted),
    ReturnRejected(ReturnRejected),
}

impl Event for ReturnRequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReturnRequestEvent::ReturnRequested(_) => "sales.return_request.requested",
            ReturnRequestEvent::ReturnAccepted(_) => "sales.return_request.accepted",
            ReturnRequestEvent::ReturnRejected(_) => "sales.return_request.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReturnRequestEvent::ReturnRequested(e) => e.occurred_at,
            ReturnRequestEvent::ReturnAccepted(e) => e.occurred_at,
            ReturnRequestEvent::ReturnRejected(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn test_request() -> ReturnRequest {
        let (request, _) = ReturnRequest::create(
            ReturnRequestId::new(AggregateId::new()),
            SalesOrderId::new(AggregateId::new()),
            "persistent gearbox noise",
            Utc::now(),
        )
        .unwrap();
        request
    }

    #[test]
    fn create_requires_a_reason() {
        let result = ReturnRequest::create(
            ReturnRequestId::new(AggregateId::new()),
            SalesOrderId::new(AggregateId::new()),
            "   ",
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn accept_records_the_refund() {
        let mut request = test_request();
        request.accept(usd(dec!(21500)), Utc::now()).unwrap();
        assert_eq!(request.status(), ReturnRequestStatus::Accepted);
        assert_eq!(request.refund_amount(), Some(&usd(dec!(21500))));
    }

    #[test]
    fn decided_requests_stay_decided() {
        let mut request = test_request();
        request.reject("wear and tear", Utc::now()).unwrap();

        assert!(request.accept(usd(dec!(100)), Utc::now()).is_err());
        assert!(request.reject("again", Utc::now()).is_err());
    }
}
