//! Item Ledger and Stock Movement Log, both scoped to one unit of work.
//!
//! The ledger is the only writer of `current_stock`; every change it makes is
//! followed by exactly one movement appended through [`MovementLog`].

use chrono::{DateTime, Utc};
use tracing::debug;

use stockroom_core::{DomainError, ItemId, MovementId};
use stockroom_inventory::{Item, NegativeStock, StockChange, StockMovement};

use crate::error::EngineResult;
use crate::store::UnitOfWork;

pub struct ItemLedger<'a, U> {
    uow: &'a mut U,
}

impl<'a, U: UnitOfWork> ItemLedger<'a, U> {
    pub fn new(uow: &'a mut U) -> Self {
        Self { uow }
    }

    /// Load and lock an item.
    pub async fn get(&mut self, item_id: ItemId) -> EngineResult<Item> {
        self.uow
            .lock_item(item_id)
            .await?
            .ok_or_else(|| DomainError::ItemNotFound(item_id).into())
    }

    /// Apply a signed delta to an item's stock.
    ///
    /// The sufficiency check runs before anything is written. The write is a
    /// compare-and-set against the level just read.
    pub async fn apply_delta(
        &mut self,
        item_id: ItemId,
        delta: i64,
        negative: NegativeStock,
        now: DateTime<Utc>,
    ) -> EngineResult<StockChange> {
        let mut item = self.get(item_id).await?;
        let change = item.apply_delta(delta, negative, now)?;

        self.uow
            .compare_and_set_stock(item_id, change.previous_stock, change.new_stock, now)
            .await?;

        debug!(
            item_id = %item_id,
            previous_stock = change.previous_stock,
            new_stock = change.new_stock,
            "stock updated"
        );
        Ok(change)
    }
}

/// Append-only. Reads go through `WarehouseStore::list_movements`.
pub struct MovementLog<'a, U> {
    uow: &'a mut U,
}

impl<'a, U: UnitOfWork> MovementLog<'a, U> {
    pub fn new(uow: &'a mut U) -> Self {
        Self { uow }
    }

    pub async fn record(&mut self, movement: StockMovement) -> EngineResult<MovementId> {
        movement.validate()?;
        self.uow.append_movement(&movement).await?;
        Ok(movement.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryWarehouseStore, MovementFilter, WarehouseStore};
    use crate::EngineError;
    use stockroom_core::{CategoryId, UserId};
    use stockroom_inventory::NewItem;

    async fn store_with_item(stock: i64) -> (InMemoryWarehouseStore, ItemId) {
        let store = InMemoryWarehouseStore::new();
        let item = Item::register(
            ItemId::new(),
            "BOLT-000001".to_string(),
            NewItem {
                name: "Bolt".to_string(),
                category_id: CategoryId::new(),
                unit: "pcs".to_string(),
                min_stock: 0,
                initial_stock: stock,
                location: String::new(),
            },
            Utc::now(),
        )
        .unwrap();
        let id = item.id;
        let mut uow = store.begin().await.unwrap();
        uow.insert_item(&item).await.unwrap();
        uow.commit().await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn sequential_deltas_compound_within_one_unit_of_work() {
        let (store, id) = store_with_item(10).await;
        let mut uow = store.begin().await.unwrap();

        let first = ItemLedger::new(&mut uow)
            .apply_delta(id, -4, NegativeStock::Forbid, Utc::now())
            .await
            .unwrap();
        let second = ItemLedger::new(&mut uow)
            .apply_delta(id, -3, NegativeStock::Forbid, Utc::now())
            .await
            .unwrap();

        assert_eq!((first.previous_stock, first.new_stock), (10, 6));
        assert_eq!((second.previous_stock, second.new_stock), (6, 3));
    }

    #[tokio::test]
    async fn missing_item_is_item_not_found() {
        let store = InMemoryWarehouseStore::new();
        let mut uow = store.begin().await.unwrap();
        let missing = ItemId::new();

        let err = ItemLedger::new(&mut uow)
            .apply_delta(missing, 1, NegativeStock::Forbid, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Domain(DomainError::ItemNotFound(missing)));
    }

    #[tokio::test]
    async fn movement_log_rejects_inconsistent_entries() {
        let (store, id) = store_with_item(10).await;
        let mut uow = store.begin().await.unwrap();

        let change = ItemLedger::new(&mut uow)
            .apply_delta(id, 5, NegativeStock::Forbid, Utc::now())
            .await
            .unwrap();
        let mut movement = StockMovement::record(
            MovementId::new(),
            &change,
            "IN-20260101-AAAA",
            UserId::new(),
            "Incoming goods approved",
            Utc::now(),
        )
        .unwrap();
        movement.new_stock += 1;

        let err = MovementLog::new(&mut uow).record(movement).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn recorded_movements_are_listed_after_commit() {
        let (store, id) = store_with_item(10).await;
        let mut uow = store.begin().await.unwrap();

        let change = ItemLedger::new(&mut uow)
            .apply_delta(id, 5, NegativeStock::Forbid, Utc::now())
            .await
            .unwrap();
        let movement = StockMovement::record(
            MovementId::new(),
            &change,
            "IN-20260101-AAAA",
            UserId::new(),
            "Incoming goods approved",
            Utc::now(),
        )
        .unwrap();
        let movement_id = MovementLog::new(&mut uow).record(movement).await.unwrap();
        uow.commit().await.unwrap();

        let listed = store.list_movements(MovementFilter::for_item(id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, movement_id);
        assert_eq!(listed[0].new_stock, 15);
    }
}
