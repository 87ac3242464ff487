//! Persistence ports and in-memory implementation.

pub mod in_memory;
pub mod port;

pub use in_memory::InMemoryDealershipStore;
pub use port::{
    DealershipStore, GoodsReceiptStore, PartyStore, PurchaseOrderStore, ReturnRequestStore,
    SalesOrderStore, StoreError, VehicleStore, WriteBatch, WriteOp,
};
