//! Human-readable identifiers: transaction numbers and SKUs.
//!
//! Both are random and collision-checked inside the creating unit of work, then
//! re-rolled up to a fixed number of attempts.

use std::sync::Mutex;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use stockroom_core::DomainError;
use stockroom_inventory::{random_base36, sku_candidate};

use crate::error::EngineResult;
use crate::store::UnitOfWork;

/// Length of the random part of a transaction number.
pub const NUMBER_SUFFIX_LEN: usize = 4;

/// `{PREFIX}-{YYYYMMDD}-{suffix}`.
pub fn format_number(prefix: &str, date: NaiveDate, suffix: &str) -> String {
    format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))
}

#[derive(Debug)]
pub struct NumberingService {
    rng: Mutex<StdRng>,
    attempts: u32,
}

impl NumberingService {
    pub fn new(attempts: u32) -> Self {
        Self::with_rng(StdRng::from_entropy(), attempts)
    }

    /// Deterministic sequence, for tests.
    pub fn seeded(seed: u64, attempts: u32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), attempts)
    }

    fn with_rng(rng: StdRng, attempts: u32) -> Self {
        Self {
            rng: Mutex::new(rng),
            attempts: attempts.max(1),
        }
    }

    /// One transaction number candidate; uniqueness is not checked.
    pub fn candidate(&self, prefix: &str, date: NaiveDate) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        format_number(prefix, date, &random_base36(&mut *rng, NUMBER_SUFFIX_LEN))
    }

    fn sku(&self, category_name: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sku_candidate(&mut *rng, category_name)
    }

    /// Next unused transaction number for `prefix` on `date`.
    pub async fn next_transaction_number<U: UnitOfWork>(
        &self,
        uow: &mut U,
        prefix: &str,
        date: NaiveDate,
    ) -> EngineResult<String> {
        for attempt in 1..=self.attempts {
            let number = self.candidate(prefix, date);
            if !uow.transaction_number_exists(&number).await? {
                return Ok(number);
            }
            warn!(%number, attempt, "transaction number collision, re-rolling");
        }
        Err(DomainError::conflict(format!(
            "no unused {prefix} transaction number after {} attempts",
            self.attempts
        ))
        .into())
    }

    /// Next unused SKU for an item in `category_name`.
    pub async fn next_sku<U: UnitOfWork>(
        &self,
        uow: &mut U,
        category_name: &str,
    ) -> EngineResult<String> {
        for attempt in 1..=self.attempts {
            let sku = self.sku(category_name);
            if !uow.sku_exists(&sku).await? {
                return Ok(sku);
            }
            warn!(%sku, attempt, "sku collision, re-rolling");
        }
        Err(DomainError::conflict(format!(
            "no unused sku after {} attempts",
            self.attempts
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn number_has_prefix_date_and_base36_suffix() {
        let numbering = NumberingService::seeded(7, 4);
        let number = numbering.candidate("REQ", date());

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "REQ");
        assert_eq!(parts[1], "20260307");
        assert_eq!(parts[2].len(), NUMBER_SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let a = NumberingService::seeded(42, 4);
        let b = NumberingService::seeded(42, 4);
        assert_eq!(a.candidate("IN", date()), b.candidate("IN", date()));
        assert_eq!(a.candidate("IN", date()), b.candidate("IN", date()));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(NumberingService::new(0).attempts, 1);
    }
}
