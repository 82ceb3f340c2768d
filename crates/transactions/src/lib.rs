//! Warehouse transaction domain module.
//!
//! One aggregate covers incoming goods, outgoing goods, item requests and
//! purchase orders. They share the DRAFT → WAITING_APPROVAL → APPROVED/REJECTED
//! lifecycle and differ only in header fields and in the stock effect of
//! approval, which is looked up per kind in [`kind::TransactionKind::stock_effect`].
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod header;
pub mod kind;
pub mod line;
pub mod status;
pub mod transaction;

pub use header::{
    IncomingGoodsHeader, ItemRequestHeader, OutgoingGoodsHeader, PurchaseOrderHeader,
    TransactionHeader,
};
pub use kind::{StockEffect, StockPolicy, TransactionKind};
pub use line::{TransactionLine, validate_lines};
pub use status::TransactionStatus;
pub use transaction::{
    ApproveTransaction, DeletePolicy, OpenTransaction, RejectTransaction, SubmitTransaction,
    Transaction, TransactionApproved, TransactionCommand, TransactionEvent, TransactionRecord,
    TransactionRejected, TransactionSubmitted, TransactionUpdated, UpdateTransaction,
};
