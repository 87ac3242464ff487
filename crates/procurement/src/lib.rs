//! Procurement domain module.
//!
//! The path by which new stock enters inventory: a purchase order is placed
//! with a supplier, goods arrive against it as a receipt, and only a receipt
//! that survives inspection materializes vehicles.

pub mod order;
pub mod receipt;

pub use order::{
    PurchaseOrder, PurchaseOrderCancelled, PurchaseOrderCreated, PurchaseOrderEvent,
    PurchaseOrderId, PurchaseOrderLine, PurchaseOrderLineAdded, PurchaseOrderLineRemoved,
    PurchaseOrderLineUpdated, PurchaseOrderStatus, PurchaseOrderStatusChanged, SupplierId,
};
pub use receipt::{
    GoodsReceipt, GoodsReceiptAccepted, GoodsReceiptCompleted, GoodsReceiptCreated,
    GoodsReceiptEvent, GoodsReceiptId, GoodsReceiptInspected, GoodsReceiptRejected,
    GoodsReceiptStatus, Inspection, ReceiptLine,
};
