//! Transaction engine (application-level orchestration).
//!
//! Every mutating operation runs as one unit of work:
//!
//! ```text
//! begin unit of work
//!   ↓
//! 1. Lock the transaction row (NotFound when absent or of another kind)
//!   ↓
//! 2. Handle the command on the aggregate (pure; status and payload checks)
//!   ↓
//! 3. Approve only: lock affected items, then per approved line
//!    ItemLedger::apply_delta → MovementLog::record
//!   ↓
//! 4. Apply events, persist the transaction under its previous version
//!   ↓
//! commit
//! ```
//!
//! Any error before the commit drops the unit of work, which discards every
//! stock change and movement staged so far.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};

use stockroom_core::{
    Aggregate, AggregateRoot, CategoryId, DomainError, ExpectedVersion, ItemId, MovementId,
    Principal, SupplierId, TransactionId,
};
use stockroom_inventory::{Category, Item, NewItem, NewSupplier, StockMovement, Supplier};
use stockroom_transactions::{
    ApproveTransaction, DeletePolicy, OpenTransaction, RejectTransaction, StockPolicy,
    SubmitTransaction, Transaction, TransactionCommand, TransactionEvent, TransactionHeader,
    TransactionKind, TransactionLine, TransactionRecord, UpdateTransaction, validate_lines,
};

use crate::error::EngineResult;
use crate::ledger::{ItemLedger, MovementLog};
use crate::numbering::NumberingService;
use crate::store::{MovementFilter, UnitOfWork, WarehouseStore};

/// Engine policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub stock: StockPolicy,
    pub delete: DeletePolicy,
    /// Collision retry budget for generated numbers and SKUs.
    pub number_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stock: StockPolicy::default(),
            delete: DeletePolicy::default(),
            number_attempts: 16,
        }
    }
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub transaction_id: TransactionId,
    pub number: String,
    pub approved_line_count: usize,
    /// Lines actually removed, not the length of the caller's id list.
    pub rejected_line_count: usize,
}

pub struct TransactionEngine<S> {
    store: S,
    numbering: NumberingService,
    config: EngineConfig,
}

impl<S: WarehouseStore> TransactionEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        let numbering = NumberingService::new(config.number_attempts);
        Self::with_numbering(store, config, numbering)
    }

    pub fn with_numbering(store: S, config: EngineConfig, numbering: NumberingService) -> Self {
        Self {
            store,
            numbering,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(
        skip(self, header, lines, creator),
        fields(kind = %kind, created_by = %creator.id, line_count = lines.len()),
        err
    )]
    pub async fn create_transaction(
        &self,
        kind: TransactionKind,
        header: TransactionHeader,
        lines: Vec<TransactionLine>,
        creator: &Principal,
    ) -> EngineResult<TransactionRecord> {
        ensure_header_kind(kind, &header)?;
        header.validate()?;
        validate_lines(&lines)?;

        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        check_references(&mut uow, &header, &lines).await?;

        let number = self
            .numbering
            .next_transaction_number(&mut uow, kind.number_prefix(), now.date_naive())
            .await?;
        let transaction = Transaction::open(OpenTransaction {
            transaction_id: TransactionId::new(),
            number,
            header,
            lines,
            created_by: creator.id,
            occurred_at: now,
        })?;

        uow.insert_transaction(&transaction).await?;
        uow.commit().await?;

        info!(
            transaction_id = %transaction.id(),
            number = %transaction.number(),
            "transaction created"
        );
        Ok(transaction.into_record())
    }

    #[instrument(skip(self, header, lines), fields(kind = %kind, transaction_id = %id), err)]
    pub async fn update_transaction(
        &self,
        kind: TransactionKind,
        id: TransactionId,
        header: TransactionHeader,
        lines: Vec<TransactionLine>,
    ) -> EngineResult<TransactionRecord> {
        let mut uow = self.store.begin().await?;
        let mut transaction = lock_transaction(&mut uow, kind, id).await?;

        let events = transaction.handle(&TransactionCommand::Update(UpdateTransaction {
            header: header.clone(),
            lines: lines.clone(),
            occurred_at: Utc::now(),
        }))?;
        check_references(&mut uow, &header, &lines).await?;

        persist(&mut uow, &mut transaction, &events).await?;
        uow.commit().await?;

        info!(line_count = transaction.lines().len(), "transaction updated");
        Ok(transaction.into_record())
    }

    #[instrument(skip(self), fields(kind = %kind, transaction_id = %id), err)]
    pub async fn submit_transaction(
        &self,
        kind: TransactionKind,
        id: TransactionId,
    ) -> EngineResult<TransactionRecord> {
        let mut uow = self.store.begin().await?;
        let mut transaction = lock_transaction(&mut uow, kind, id).await?;

        let events = transaction.handle(&TransactionCommand::Submit(SubmitTransaction {
            occurred_at: Utc::now(),
        }))?;

        persist(&mut uow, &mut transaction, &events).await?;
        uow.commit().await?;

        info!(number = %transaction.number(), "transaction submitted");
        Ok(transaction.into_record())
    }

    /// Approve a waiting transaction, excluding the lines of `rejected_item_ids`.
    ///
    /// Remaining lines are applied in line order; each one changes its item's
    /// stock and appends one movement referencing the transaction number. All
    /// of it commits together or not at all.
    #[instrument(
        skip(self, rejected_item_ids, signature, approver),
        fields(
            kind = %kind,
            transaction_id = %id,
            approved_by = %approver.id,
            rejected_ids = rejected_item_ids.len()
        ),
        err
    )]
    pub async fn approve_transaction(
        &self,
        kind: TransactionKind,
        id: TransactionId,
        rejected_item_ids: Vec<ItemId>,
        signature: Option<String>,
        approver: &Principal,
    ) -> EngineResult<ApprovalOutcome> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;
        let mut transaction = lock_transaction(&mut uow, kind, id).await?;

        let events = transaction.handle(&TransactionCommand::Approve(ApproveTransaction {
            rejected_item_ids,
            signature_image: signature,
            approved_by: approver.id,
            occurred_at: now,
        }))?;
        let Some(TransactionEvent::Approved(approval)) = events.first() else {
            return Err(DomainError::invariant("approval produced no approval event").into());
        };

        // Lock every affected item in a stable order before the first write so
        // approvals sharing items cannot deadlock.
        let mut item_ids: Vec<ItemId> = approval.approved_lines.iter().map(|l| l.item_id).collect();
        item_ids.sort_by_key(|id| *id.as_uuid());
        item_ids.dedup();
        {
            let mut ledger = ItemLedger::new(&mut uow);
            for item_id in item_ids {
                ledger.get(item_id).await?;
            }
        }

        let effect = kind.stock_effect(self.config.stock);
        for line in &approval.approved_lines {
            let change = ItemLedger::new(&mut uow)
                .apply_delta(line.item_id, effect.delta(line.quantity), effect.negative, now)
                .await?;
            let movement = StockMovement::record(
                MovementId::new(),
                &change,
                transaction.number(),
                approver.id,
                effect.movement_note,
                now,
            )?;
            MovementLog::new(&mut uow).record(movement).await?;
        }

        let outcome = ApprovalOutcome {
            transaction_id: id,
            number: transaction.number().to_string(),
            approved_line_count: approval.approved_lines.len(),
            rejected_line_count: approval.rejected_lines.len(),
        };

        persist(&mut uow, &mut transaction, &events).await?;
        uow.commit().await?;

        info!(
            number = %outcome.number,
            approved_lines = outcome.approved_line_count,
            rejected_lines = outcome.rejected_line_count,
            "transaction approved"
        );
        Ok(outcome)
    }

    /// Reject the whole transaction. No stock effect.
    #[instrument(
        skip(self, reason, rejecter),
        fields(kind = %kind, transaction_id = %id, rejected_by = %rejecter.id),
        err
    )]
    pub async fn reject_transaction(
        &self,
        kind: TransactionKind,
        id: TransactionId,
        reason: String,
        rejecter: &Principal,
    ) -> EngineResult<TransactionRecord> {
        let mut uow = self.store.begin().await?;
        let mut transaction = lock_transaction(&mut uow, kind, id).await?;

        let events = transaction.handle(&TransactionCommand::Reject(RejectTransaction {
            reason,
            rejected_by: rejecter.id,
            occurred_at: Utc::now(),
        }))?;

        persist(&mut uow, &mut transaction, &events).await?;
        uow.commit().await?;

        info!(number = %transaction.number(), "transaction rejected");
        Ok(transaction.into_record())
    }

    #[instrument(skip(self), fields(kind = %kind, transaction_id = %id), err)]
    pub async fn delete_transaction(&self, kind: TransactionKind, id: TransactionId) -> EngineResult<()> {
        let mut uow = self.store.begin().await?;
        let transaction = lock_transaction(&mut uow, kind, id).await?;
        transaction.check_delete(self.config.delete)?;

        if !uow.delete_transaction(id).await? {
            return Err(not_found(kind, id).into());
        }
        uow.commit().await?;

        info!(
            number = %transaction.number(),
            status = %transaction.status(),
            "transaction deleted"
        );
        Ok(())
    }

    pub async fn get_transaction(
        &self,
        kind: TransactionKind,
        id: TransactionId,
    ) -> EngineResult<TransactionRecord> {
        match self.store.get_transaction(id).await? {
            Some(tx) if tx.kind() == kind => Ok(tx.into_record()),
            _ => Err(not_found(kind, id).into()),
        }
    }

    /// Movements oldest first, optionally for one item.
    pub async fn list_stock_movements(&self, item_id: Option<ItemId>) -> EngineResult<Vec<StockMovement>> {
        Ok(self.store.list_movements(MovementFilter { item_id }).await?)
    }

    pub async fn low_stock_items(&self) -> EngineResult<Vec<Item>> {
        Ok(self.store.list_low_stock_items().await?)
    }

    pub async fn get_item(&self, id: ItemId) -> EngineResult<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| DomainError::ItemNotFound(id).into())
    }

    #[instrument(skip(self, description), err)]
    pub async fn register_category(&self, name: String, description: String) -> EngineResult<Category> {
        let category = Category::new(CategoryId::new(), name, description, Utc::now())?;

        let mut uow = self.store.begin().await?;
        uow.insert_category(&category).await?;
        uow.commit().await?;

        info!(category_id = %category.id, "category registered");
        Ok(category)
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn register_supplier(&self, new: NewSupplier) -> EngineResult<Supplier> {
        let supplier = Supplier::register(SupplierId::new(), new, Utc::now())?;

        let mut uow = self.store.begin().await?;
        uow.insert_supplier(&supplier).await?;
        uow.commit().await?;

        info!(supplier_id = %supplier.id, "supplier registered");
        Ok(supplier)
    }

    /// Register an item under an existing category with a generated SKU.
    #[instrument(skip(self, new), fields(name = %new.name, category_id = %new.category_id), err)]
    pub async fn register_item(&self, new: NewItem) -> EngineResult<Item> {
        let now = Utc::now();
        let mut uow = self.store.begin().await?;

        let category = uow
            .category(new.category_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("category {}", new.category_id)))?;
        let sku = self.numbering.next_sku(&mut uow, &category.name).await?;
        let item = Item::register(ItemId::new(), sku, new, now)?;

        uow.insert_item(&item).await?;
        uow.commit().await?;

        info!(item_id = %item.id, sku = %item.sku, "item registered");
        Ok(item)
    }
}

fn not_found(kind: TransactionKind, id: TransactionId) -> DomainError {
    DomainError::not_found(format!("{kind} {id}"))
}

fn ensure_header_kind(kind: TransactionKind, header: &TransactionHeader) -> EngineResult<()> {
    if header.kind() != kind {
        return Err(DomainError::validation(format!(
            "header is for {} but the transaction is {kind}",
            header.kind()
        ))
        .into());
    }
    Ok(())
}

/// Load and lock a transaction of the given kind.
async fn lock_transaction<U: UnitOfWork>(
    uow: &mut U,
    kind: TransactionKind,
    id: TransactionId,
) -> EngineResult<Transaction> {
    match uow.lock_transaction(id).await? {
        Some(tx) if tx.kind() == kind => Ok(tx),
        _ => Err(not_found(kind, id).into()),
    }
}

/// Suppliers and items referenced by a payload must exist.
async fn check_references<U: UnitOfWork>(
    uow: &mut U,
    header: &TransactionHeader,
    lines: &[TransactionLine],
) -> EngineResult<()> {
    if let Some(supplier_id) = header.supplier_id() {
        if !uow.supplier_exists(supplier_id).await? {
            return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
        }
    }
    for line in lines {
        if !uow.item_exists(line.item_id).await? {
            return Err(DomainError::ItemNotFound(line.item_id).into());
        }
    }
    Ok(())
}

/// Apply events and write the transaction back, fenced on its prior version.
async fn persist<U: UnitOfWork>(
    uow: &mut U,
    transaction: &mut Transaction,
    events: &[TransactionEvent],
) -> EngineResult<()> {
    let expected = ExpectedVersion::Exact(transaction.version());
    for event in events {
        debug!(event = event.event_type(), from_version = transaction.version(), "applying event");
        transaction.apply(event);
    }
    uow.update_transaction(transaction, expected).await?;
    Ok(())
}
