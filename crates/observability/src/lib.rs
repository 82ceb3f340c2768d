//! Process-wide tracing setup.

/// Initialize process-wide tracing with the format from `STOCKROOM_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{DEFAULT_DIRECTIVES, LogFormat, init_with};
