use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId};

/// One `(item, quantity)` entry of a transaction.
///
/// Lines are owned by their transaction and replaced wholesale on edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Price per unit in minor currency units, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<i64>,
}

impl TransactionLine {
    pub fn new(item_id: ItemId, quantity: i64) -> Self {
        Self {
            item_id,
            quantity,
            unit_price: None,
        }
    }

    pub fn with_unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// Validate a full line set.
///
/// Requires at least one line, positive quantities, non-negative prices, and at
/// most one line per item. Approval rejects lines by item id, so the
/// one-line-per-item rule keeps "reject item X" unambiguous.
pub fn validate_lines(lines: &[TransactionLine]) -> DomainResult<()> {
    if lines.is_empty() {
        return Err(DomainError::validation("at least one line is required"));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "line {}: quantity must be positive",
                idx + 1
            )));
        }
        if matches!(line.unit_price, Some(p) if p < 0) {
            return Err(DomainError::validation(format!(
                "line {}: unit price cannot be negative",
                idx + 1
            )));
        }
        if !seen.insert(line.item_id) {
            return Err(DomainError::validation(format!(
                "line {}: item {} appears more than once",
                idx + 1,
                line.item_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_set_is_invalid() {
        assert!(matches!(validate_lines(&[]), Err(DomainError::Validation(_))));
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let lines = vec![TransactionLine::new(ItemId::new(), 0)];
        assert!(validate_lines(&lines).is_err());
        let lines = vec![TransactionLine::new(ItemId::new(), -2)];
        assert!(validate_lines(&lines).is_err());
    }

    #[test]
    fn duplicate_items_are_invalid() {
        let item = ItemId::new();
        let lines = vec![TransactionLine::new(item, 1), TransactionLine::new(item, 2)];
        let err = validate_lines(&lines).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("more than once")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn negative_unit_price_is_invalid() {
        let lines = vec![TransactionLine::new(ItemId::new(), 1).with_unit_price(-1)];
        assert!(validate_lines(&lines).is_err());
    }

    #[test]
    fn distinct_positive_lines_are_valid() {
        let lines = vec![
            TransactionLine::new(ItemId::new(), 4).with_unit_price(1_250),
            TransactionLine::new(ItemId::new(), 6),
        ];
        assert!(validate_lines(&lines).is_ok());
    }
}
