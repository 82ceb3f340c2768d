//! Inventory domain module: items, their stock ledger arithmetic, and the
//! stock movement audit record.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod catalog;
pub mod item;
pub mod movement;
pub mod sku;

pub use catalog::{Category, NewSupplier, Supplier};
pub use item::{Item, NegativeStock, NewItem, StockChange, StockDirection};
pub use movement::StockMovement;
pub use sku::{random_base36, sku_candidate, sku_prefix};
