//! Infrastructure layer: persistence ports, unit of work, command surface.
//!
//! The domain crates stay pure; everything that touches storage, transactions
//! or event publication lives here.

pub mod cancel;
pub mod handlers;
pub mod store;
pub mod unit_of_work;


pub use cancel::CancellationToken;
pub use handlers::{CommandError, Dealership};
pub use store::{
    DealershipStore, GoodsReceiptStore, InMemoryDealershipStore, PartyStore, PurchaseOrderStore,
    ReturnRequestStore, SalesOrderStore, StoreError, VehicleStore, WriteBatch, WriteOp,
};
pub use unit_of_work::UnitOfWork;
