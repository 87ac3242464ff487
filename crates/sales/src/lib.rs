//! Sales domain module.
//!
//! The path by which stock leaves inventory: an order reserves a vehicle,
//! completion sells it, cancellation releases it, and an accepted return
//! request brings it back.

pub mod order;
pub mod return_request;

pub use order::{
    OrderCancelled, OrderCompleted, OrderCreated, OrderRefunded, OrderStatusChanged,
    PaymentMethod, SalesOrder, SalesOrderEvent, SalesOrderId, SalesOrderStatus,
};
pub use return_request::{
    ReturnAccepted, ReturnRejected, ReturnRequest, ReturnRequestEvent, ReturnRequestId,
    ReturnRequestStatus, ReturnRequested,
};
