//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lifecycle, stock rules). Storage failures are modelled by the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller payload failed validation (empty lines, non-positive quantity,
    /// missing header field, unknown supplier, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The requested transaction (or other record) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A line references an item that does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The requested lifecycle transition is not permitted from the current status.
    #[error("cannot {action} a transaction in status {current}")]
    InvalidState {
        current: String,
        action: &'static str,
    },

    /// A stock-out line asks for more than the item currently holds.
    #[error("insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: ItemId,
        available: i64,
        requested: i64,
    },

    /// Every line of the transaction was rejected during approval.
    #[error("all items were rejected; nothing to approve")]
    NoApprovableItems,

    /// A conflict occurred (identifier collision, stale write).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(current: impl core::fmt::Display, action: &'static str) -> Self {
        Self::InvalidState {
            current: current.to_string(),
            action,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
