//! Kind-specific header fields (the counterparty of a transaction).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, SupplierId};

use crate::kind::TransactionKind;

/// Goods received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingGoodsHeader {
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Goods issued to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingGoodsHeader {
    pub destination: String,
    pub recipient_name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Internal request from a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequestHeader {
    pub department: String,
    pub requested_by: String,
    #[serde(default)]
    pub required_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderHeader {
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Header of any transaction; the variant fixes the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionHeader {
    IncomingGoods(IncomingGoodsHeader),
    OutgoingGoods(OutgoingGoodsHeader),
    ItemRequest(ItemRequestHeader),
    PurchaseOrder(PurchaseOrderHeader),
}

impl TransactionHeader {
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionHeader::IncomingGoods(_) => TransactionKind::IncomingGoods,
            TransactionHeader::OutgoingGoods(_) => TransactionKind::OutgoingGoods,
            TransactionHeader::ItemRequest(_) => TransactionKind::ItemRequest,
            TransactionHeader::PurchaseOrder(_) => TransactionKind::PurchaseOrder,
        }
    }

    /// Supplier referenced by the header, if the kind has one.
    pub fn supplier_id(&self) -> Option<SupplierId> {
        match self {
            TransactionHeader::IncomingGoods(h) => Some(h.supplier_id),
            TransactionHeader::PurchaseOrder(h) => Some(h.supplier_id),
            TransactionHeader::OutgoingGoods(_) | TransactionHeader::ItemRequest(_) => None,
        }
    }

    /// Required-field checks. Supplier existence is checked by the caller.
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            TransactionHeader::OutgoingGoods(h) => {
                require("destination", &h.destination)?;
                require("recipientName", &h.recipient_name)
            }
            TransactionHeader::ItemRequest(h) => {
                require("department", &h.department)?;
                require("requestedBy", &h.requested_by)
            }
            TransactionHeader::IncomingGoods(_) | TransactionHeader::PurchaseOrder(_) => Ok(()),
        }
    }
}

fn require(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}
