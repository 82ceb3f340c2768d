//! Random base36 codes for SKUs and transaction numbers.

use rand::Rng;

const BASE36_UPPER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random part of a generated SKU.
pub const SKU_SUFFIX_LEN: usize = 6;

/// `len` random characters from `[0-9A-Z]`.
pub fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36_UPPER[rng.gen_range(0..BASE36_UPPER.len())] as char)
        .collect()
}

/// First four ASCII letters of the category name, uppercased.
///
/// Falls back to `ITEM` when the name has no letters.
pub fn sku_prefix(category_name: &str) -> String {
    let prefix: String = category_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(4)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if prefix.is_empty() {
        "ITEM".to_string()
    } else {
        prefix
    }
}

/// One SKU candidate: `{PREFIX}-{6 base36 chars}`. Uniqueness is the caller's job.
pub fn sku_candidate<R: Rng + ?Sized>(rng: &mut R, category_name: &str) -> String {
    format!(
        "{}-{}",
        sku_prefix(category_name),
        random_base36(rng, SKU_SUFFIX_LEN)
    )
}
