use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_core::{
    AggregateRoot, CategoryId, ExpectedVersion, ItemId, SupplierId, TransactionId,
};
use stockroom_inventory::{Category, Item, StockMovement, Supplier};
use stockroom_transactions::Transaction;

use super::{MovementFilter, StoreError, UnitOfWork, WarehouseStore};

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, Item>,
    categories: HashMap<CategoryId, Category>,
    suppliers: HashMap<SupplierId, Supplier>,
    transactions: HashMap<TransactionId, Transaction>,
    movements: Vec<StockMovement>,
}

/// In-memory warehouse store.
///
/// Intended for tests/dev. A unit of work holds the single table lock for its
/// whole lifetime, so mutations are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    type Uow = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, StoreError> {
        Ok(InMemoryUnitOfWork {
            tables: Arc::clone(&self.tables).lock_owned().await,
            staged: Staged::default(),
        })
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.tables.lock().await.transactions.get(&id).cloned())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn list_low_stock_items(&self) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|item| item.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(items)
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }
}

/// Changes made inside a unit of work, applied on commit.
#[derive(Debug, Default)]
struct Staged {
    items: HashMap<ItemId, Item>,
    categories: HashMap<CategoryId, Category>,
    suppliers: HashMap<SupplierId, Supplier>,
    /// `None` marks a deletion.
    transactions: HashMap<TransactionId, Option<Transaction>>,
    movements: Vec<StockMovement>,
}

pub struct InMemoryUnitOfWork {
    tables: OwnedMutexGuard<Tables>,
    staged: Staged,
}

impl InMemoryUnitOfWork {
    fn current_item(&self, id: ItemId) -> Option<&Item> {
        self.staged
            .items
            .get(&id)
            .or_else(|| self.tables.items.get(&id))
    }

    fn current_transaction(&self, id: TransactionId) -> Option<&Transaction> {
        match self.staged.transactions.get(&id) {
            Some(slot) => slot.as_ref(),
            None => self.tables.transactions.get(&id),
        }
    }

    fn visible_transactions(&self) -> impl Iterator<Item = &Transaction> {
        let committed = self
            .tables
            .transactions
            .iter()
            .filter(|(id, _)| !self.staged.transactions.contains_key(*id))
            .map(|(_, tx)| tx);
        let staged = self.staged.transactions.values().flatten();
        committed.chain(staged)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.current_transaction(id).cloned())
    }

    async fn transaction_number_exists(&mut self, number: &str) -> Result<bool, StoreError> {
        Ok(self.visible_transactions().any(|tx| tx.number() == number))
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        let id = transaction.id();
        if self.current_transaction(id).is_some() {
            return Err(StoreError::Conflict(format!("transaction {id} already exists")));
        }
        if self.transaction_number_exists(transaction.number()).await? {
            return Err(StoreError::Conflict(format!(
                "transaction number {} already exists",
                transaction.number()
            )));
        }
        self.staged.transactions.insert(id, Some(transaction.clone()));
        Ok(())
    }

    async fn update_transaction(
        &mut self,
        transaction: &Transaction,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let id = transaction.id();
        let stored = self
            .current_transaction(id)
            .ok_or_else(|| StoreError::Conflict(format!("transaction {id} no longer exists")))?;
        if !expected.matches(stored.version()) {
            return Err(StoreError::Conflict(format!(
                "transaction {id} is at version {}, expected {expected:?}",
                stored.version()
            )));
        }
        self.staged.transactions.insert(id, Some(transaction.clone()));
        Ok(())
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, StoreError> {
        let existed = self.current_transaction(id).is_some();
        if existed {
            self.staged.transactions.insert(id, None);
        }
        Ok(existed)
    }

    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.current_item(id).cloned())
    }

    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError> {
        Ok(self.current_item(id).is_some())
    }

    async fn sku_exists(&mut self, sku: &str) -> Result<bool, StoreError> {
        Ok(self
            .staged
            .items
            .values()
            .chain(self.tables.items.values())
            .any(|item| item.sku == sku))
    }

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        if self.current_item(item.id).is_some() {
            return Err(StoreError::Conflict(format!("item {} already exists", item.id)));
        }
        if self.sku_exists(&item.sku).await? {
            return Err(StoreError::Conflict(format!("sku {} already exists", item.sku)));
        }
        self.staged.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn compare_and_set_stock(
        &mut self,
        id: ItemId,
        expected: i64,
        new_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut item = self
            .current_item(id)
            .cloned()
            .ok_or_else(|| StoreError::Conflict(format!("item {id} no longer exists")))?;
        if item.current_stock != expected {
            return Err(StoreError::Conflict(format!(
                "item {id} stock is {}, expected {expected}",
                item.current_stock
            )));
        }
        item.current_stock = new_stock;
        item.updated_at = at;
        self.staged.items.insert(id, item);
        Ok(())
    }

    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError> {
        self.staged.movements.push(movement.clone());
        Ok(())
    }

    async fn category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self
            .staged
            .categories
            .get(&id)
            .or_else(|| self.tables.categories.get(&id))
            .cloned())
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError> {
        self.staged.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn supplier_exists(&mut self, id: SupplierId) -> Result<bool, StoreError> {
        Ok(self.staged.suppliers.contains_key(&id) || self.tables.suppliers.contains_key(&id))
    }

    async fn insert_supplier(&mut self, supplier: &Supplier) -> Result<(), StoreError> {
        self.staged.suppliers.insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self {
            mut tables,
            staged,
        } = self;

        tables.items.extend(staged.items);
        tables.categories.extend(staged.categories);
        tables.suppliers.extend(staged.suppliers);
        for (id, slot) in staged.transactions {
            match slot {
                Some(tx) => {
                    tables.transactions.insert(id, tx);
                }
                None => {
                    tables.transactions.remove(&id);
                }
            }
        }
        tables.movements.extend(staged.movements);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_inventory::NewItem;

    fn item(sku: &str, stock: i64, min: i64) -> Item {
        Item::register(
            ItemId::new(),
            sku.to_string(),
            NewItem {
                name: "Bolt".to_string(),
                category_id: CategoryId::new(),
                unit: "pcs".to_string(),
                min_stock: min,
                initial_stock: stock,
                location: String::new(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_changes() {
        let store = InMemoryWarehouseStore::new();
        let bolt = item("BOLT-000001", 10, 0);

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_item(&bolt).await.unwrap();
            assert!(uow.item_exists(bolt.id).await.unwrap());
        }

        assert!(store.get_item(bolt.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_changes_become_visible() {
        let store = InMemoryWarehouseStore::new();
        let bolt = item("BOLT-000001", 10, 0);

        let mut uow = store.begin().await.unwrap();
        uow.insert_item(&bolt).await.unwrap();
        uow.compare_and_set_stock(bolt.id, 10, 7, Utc::now()).await.unwrap();
        uow.commit().await.unwrap();

        let stored = store.get_item(bolt.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, 7);
    }

    #[tokio::test]
    async fn stale_compare_and_set_is_a_conflict() {
        let store = InMemoryWarehouseStore::new();
        let bolt = item("BOLT-000001", 10, 0);

        let mut uow = store.begin().await.unwrap();
        uow.insert_item(&bolt).await.unwrap();
        let err = uow
            .compare_and_set_stock(bolt.id, 9, 5, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let store = InMemoryWarehouseStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_item(&item("BOLT-000001", 1, 0)).await.unwrap();
        let err = uow.insert_item(&item("BOLT-000001", 1, 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn low_stock_listing_is_sorted_by_sku() {
        let store = InMemoryWarehouseStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_item(&item("NUTS-000002", 2, 5)).await.unwrap();
        uow.insert_item(&item("BOLT-000001", 5, 5)).await.unwrap();
        uow.insert_item(&item("WASH-000003", 50, 5)).await.unwrap();
        uow.commit().await.unwrap();

        let skus: Vec<String> = store
            .list_low_stock_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.sku)
            .collect();
        assert_eq!(skus, vec!["BOLT-000001", "NUTS-000002"]);
    }
}
