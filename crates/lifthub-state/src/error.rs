//! State error types.

use thiserror::Error;

/// Error raised by a plugin cache while clearing.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Clear failed: {0}")]
    ClearFailed(String),

    #[error("Cache poisoned: {0}")]
    Poisoned(String),
}

pub type StateResult<T> = Result<T, CacheError>;
