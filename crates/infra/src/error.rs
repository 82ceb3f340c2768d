use thiserror::Error;

use stockroom_core::DomainError;

use crate::store::StoreError;

/// Failure of an engine operation.
///
/// `Domain` carries the business taxonomy callers render to users; `Store` is
/// the generic internal failure (storage unavailable, corrupt rows, lost races).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            EngineError::Domain(e) => Some(e),
            EngineError::Store(_) => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
