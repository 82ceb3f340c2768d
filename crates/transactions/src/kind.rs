//! Transaction kinds and the per-kind stock-effect strategy table.

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;
use stockroom_inventory::{NegativeStock, StockDirection};

/// The four transaction kinds sharing one lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    IncomingGoods,
    OutgoingGoods,
    ItemRequest,
    PurchaseOrder,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::IncomingGoods,
        TransactionKind::OutgoingGoods,
        TransactionKind::ItemRequest,
        TransactionKind::PurchaseOrder,
    ];

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::IncomingGoods => "incoming_goods",
            TransactionKind::OutgoingGoods => "outgoing_goods",
            TransactionKind::ItemRequest => "item_request",
            TransactionKind::PurchaseOrder => "purchase_order",
        }
    }

    /// URL path segment.
    pub fn slug(self) -> &'static str {
        match self {
            TransactionKind::IncomingGoods => "incoming-goods",
            TransactionKind::OutgoingGoods => "outgoing-goods",
            TransactionKind::ItemRequest => "item-requests",
            TransactionKind::PurchaseOrder => "purchase-orders",
        }
    }

    /// Prefix of the generated transaction number.
    pub fn number_prefix(self) -> &'static str {
        match self {
            TransactionKind::IncomingGoods => "IN",
            TransactionKind::OutgoingGoods => "OUT",
            TransactionKind::ItemRequest => "REQ",
            TransactionKind::PurchaseOrder => "PO",
        }
    }

    /// Resolve how approving this kind affects stock.
    pub fn stock_effect(self, policy: StockPolicy) -> StockEffect {
        match self {
            TransactionKind::IncomingGoods => StockEffect {
                direction: StockDirection::In,
                negative: NegativeStock::Forbid,
                movement_note: "Incoming goods approved",
            },
            TransactionKind::PurchaseOrder => StockEffect {
                direction: StockDirection::In,
                negative: NegativeStock::Forbid,
                movement_note: "Stock added from approved purchase order",
            },
            TransactionKind::ItemRequest => StockEffect {
                direction: StockDirection::Out,
                negative: NegativeStock::Forbid,
                movement_note: "Item request approved",
            },
            TransactionKind::OutgoingGoods => StockEffect {
                direction: StockDirection::Out,
                negative: if policy.outgoing_requires_stock {
                    NegativeStock::Forbid
                } else {
                    NegativeStock::Allow
                },
                movement_note: "Outgoing goods approved",
            },
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    /// Accepts both the storage name and the URL slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.slug() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown transaction kind '{s}'")))
    }
}

/// Configurable part of the stock rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockPolicy {
    /// Guard OutgoingGoods approval with the same sufficiency check as ItemRequest.
    /// When off, outgoing goods may drive stock negative (backorders).
    pub outgoing_requires_stock: bool,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            outgoing_requires_stock: true,
        }
    }
}

/// Stock effect of approving one line of a given kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockEffect {
    pub direction: StockDirection,
    pub negative: NegativeStock,
    pub movement_note: &'static str,
}

impl StockEffect {
    /// Signed ledger delta for a line quantity.
    pub fn delta(&self, quantity: i64) -> i64 {
        self.direction.signed(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_in_kinds_add_and_stock_out_kinds_subtract() {
        let policy = StockPolicy::default();
        assert_eq!(TransactionKind::IncomingGoods.stock_effect(policy).delta(10), 10);
        assert_eq!(TransactionKind::PurchaseOrder.stock_effect(policy).delta(10), 10);
        assert_eq!(TransactionKind::OutgoingGoods.stock_effect(policy).delta(10), -10);
        assert_eq!(TransactionKind::ItemRequest.stock_effect(policy).delta(10), -10);
    }

    #[test]
    fn item_requests_always_check_stock() {
        let lenient = StockPolicy {
            outgoing_requires_stock: false,
        };
        assert_eq!(
            TransactionKind::ItemRequest.stock_effect(lenient).negative,
            NegativeStock::Forbid
        );
        assert_eq!(
            TransactionKind::OutgoingGoods.stock_effect(lenient).negative,
            NegativeStock::Allow
        );
        assert_eq!(
            TransactionKind::OutgoingGoods
                .stock_effect(StockPolicy::default())
                .negative,
            NegativeStock::Forbid
        );
    }

    #[test]
    fn parses_slugs_and_storage_names() {
        for kind in TransactionKind::ALL {
            assert_eq!(kind.slug().parse::<TransactionKind>().unwrap(), kind);
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("returns".parse::<TransactionKind>().is_err());
    }
}
