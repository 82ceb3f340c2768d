//! Warehouse persistence boundary.
//!
//! Reads that need no isolation go through [`WarehouseStore`] directly. Every
//! mutation runs inside a [`UnitOfWork`]: rows read through it are locked
//! against concurrent writers until it commits or is dropped. Dropping a unit
//! of work without calling [`UnitOfWork::commit`] discards everything staged in
//! it.
//!
//! Two implementations exist: [`InMemoryWarehouseStore`] (tests/dev) and
//! [`PostgresWarehouseStore`].

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_core::{CategoryId, ExpectedVersion, ItemId, SupplierId, TransactionId};
use stockroom_inventory::{Category, Item, StockMovement, Supplier};
use stockroom_transactions::Transaction;

pub use in_memory::InMemoryWarehouseStore;
pub use postgres::PostgresWarehouseStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A concurrent writer won: version guard, stock compare-and-set, or a
    /// unique key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A persisted row could not be turned back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Filter for movement listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub item_id: Option<ItemId>,
}

impl MovementFilter {
    pub fn for_item(item_id: ItemId) -> Self {
        Self {
            item_id: Some(item_id),
        }
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        self.item_id.is_none_or(|id| movement.item_id == id)
    }
}

#[async_trait]
pub trait WarehouseStore: Send + Sync + 'static {
    type Uow: UnitOfWork;

    /// Start an atomic unit of work.
    async fn begin(&self) -> Result<Self::Uow, StoreError>;

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Items at or below their minimum, ordered by SKU.
    async fn list_low_stock_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Movements in the order they were recorded.
    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError>;
}

/// One atomic unit of work.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Load a transaction and hold it against concurrent mutation.
    async fn lock_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    async fn transaction_number_exists(&mut self, number: &str) -> Result<bool, StoreError>;

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Persist a mutated transaction (header, lines, status fields).
    ///
    /// `expected` is the version the transaction had when it was locked; a
    /// mismatch is [`StoreError::Conflict`].
    async fn update_transaction(
        &mut self,
        transaction: &Transaction,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    /// Remove a transaction and its lines. Returns whether a row existed.
    async fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, StoreError>;

    /// Load an item and hold it against concurrent stock changes.
    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;

    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError>;

    async fn sku_exists(&mut self, sku: &str) -> Result<bool, StoreError>;

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError>;

    /// Move `current_stock` from `expected` to `new_stock`.
    ///
    /// Fails with [`StoreError::Conflict`] when the stored level is no longer
    /// `expected`.
    async fn compare_and_set_stock(
        &mut self,
        id: ItemId,
        expected: i64,
        new_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError>;

    async fn category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError>;

    async fn supplier_exists(&mut self, id: SupplierId) -> Result<bool, StoreError>;

    async fn insert_supplier(&mut self, supplier: &Supplier) -> Result<(), StoreError>;

    /// Make every staged change visible at once.
    async fn commit(self) -> Result<(), StoreError>;
}
