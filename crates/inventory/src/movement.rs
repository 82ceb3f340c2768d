use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId, MovementId, UserId};

use crate::item::{StockChange, StockDirection};

/// Immutable audit record of one stock change.
///
/// `reference` is the number of the transaction that caused it (soft reference).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub direction: StockDirection,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reference: String,
    pub performed_by: UserId,
    pub created_at: DateTime<Utc>,
    pub notes: String,
}

impl StockMovement {
    /// Build the movement for a ledger change.
    pub fn record(
        id: MovementId,
        change: &StockChange,
        reference: impl Into<String>,
        performed_by: UserId,
        notes: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let movement = Self {
            id,
            item_id: change.item_id,
            direction: change.direction,
            quantity: change.quantity,
            previous_stock: change.previous_stock,
            new_stock: change.new_stock,
            reference: reference.into(),
            performed_by,
            created_at,
            notes: notes.into(),
        };
        movement.validate()?;
        Ok(movement)
    }

    /// `new_stock - previous_stock` must equal the signed quantity.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::invariant("movement quantity must be positive"));
        }
        if self.reference.trim().is_empty() {
            return Err(DomainError::invariant("movement reference cannot be empty"));
        }
        if self.new_stock - self.previous_stock != self.direction.signed(self.quantity) {
            return Err(DomainError::invariant(format!(
                "movement {} of {} does not match {} -> {}",
                self.direction, self.quantity, self.previous_stock, self.new_stock
            )));
        }
        Ok(())
    }

    pub fn signed_quantity(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}
