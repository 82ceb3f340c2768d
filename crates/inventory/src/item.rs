use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, ItemId};

/// Direction of a stock change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            StockDirection::In => "in",
            StockDirection::Out => "out",
        }
    }

    /// Signed delta for a positive quantity moving in this direction.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            StockDirection::In => quantity,
            StockDirection::Out => -quantity,
        }
    }
}

impl core::fmt::Display for StockDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for StockDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(StockDirection::In),
            "out" => Ok(StockDirection::Out),
            other => Err(DomainError::validation(format!("unknown stock direction '{other}'"))),
        }
    }
}

/// Whether a stock-out may drive the level below zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NegativeStock {
    /// Fail with `InsufficientStock` instead of going negative.
    Forbid,
    /// Permit negative levels (backorders).
    Allow,
}

/// Outcome of one ledger mutation, the input for a stock movement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub item_id: ItemId,
    pub direction: StockDirection,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
}

/// A stocked item.
///
/// `current_stock` is only changed through [`Item::apply_delta`], which returns the
/// [`StockChange`] the caller must record as a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub category_id: CategoryId,
    pub unit: String,
    pub min_stock: i64,
    pub current_stock: i64,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload for a new item (SKU is generated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub category_id: CategoryId,
    pub unit: String,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub initial_stock: i64,
    #[serde(default)]
    pub location: String,
}

impl Item {
    pub fn register(
        id: ItemId,
        sku: String,
        new: NewItem,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if new.min_stock < 0 {
            return Err(DomainError::validation("minStock cannot be negative"));
        }
        if new.initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }

        Ok(Self {
            id,
            sku,
            name: new.name,
            category_id: new.category_id,
            unit: new.unit,
            min_stock: new.min_stock,
            current_stock: new.initial_stock,
            location: new.location,
            created_at: now,
            updated_at: now,
        })
    }

    /// At or below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    /// Apply a signed stock delta and report the change.
    ///
    /// The previous level is the value read immediately before this call, so
    /// repeated calls on the same item compound.
    pub fn apply_delta(
        &mut self,
        delta: i64,
        negative: NegativeStock,
        now: DateTime<Utc>,
    ) -> DomainResult<StockChange> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let previous_stock = self.current_stock;
        let new_stock = previous_stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant("stock level overflow"))?;

        if new_stock < 0 && negative == NegativeStock::Forbid {
            return Err(DomainError::InsufficientStock {
                item_id: self.id,
                available: previous_stock,
                requested: -delta,
            });
        }

        self.current_stock = new_stock;
        self.updated_at = now;

        let direction = if delta > 0 {
            StockDirection::In
        } else {
            StockDirection::Out
        };

        Ok(StockChange {
            item_id: self.id,
            direction,
            quantity: delta.abs(),
            previous_stock,
            new_stock,
        })
    }
}
