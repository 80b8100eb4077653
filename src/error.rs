use crate::domain::pool::{Balance, PoolId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoolError>;

/// Stable, machine-readable error classification exposed to callers.
///
/// The engine never retries on its own; retry, if any, is the caller's
/// responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    InsufficientFunds,
    Transfer,
    NotFound,
    Storage,
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("requested {requested} exceeds accrued entitlement {entitled}")]
    InsufficientAccrued { requested: Balance, entitled: Balance },
    #[error("requested {requested} exceeds remaining pool balance {remaining}")]
    InsufficientRemainingBalance { requested: Balance, remaining: Balance },
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("pool {0} not found")]
    NotFound(PoolId),
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Rocks(#[from] rocksdb::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::Validation(_) => ErrorKind::Validation,
            PoolError::Unauthorized(_) => ErrorKind::Authorization,
            PoolError::InsufficientAccrued { .. }
            | PoolError::InsufficientRemainingBalance { .. } => ErrorKind::InsufficientFunds,
            PoolError::Transfer(_) => ErrorKind::Transfer,
            PoolError::NotFound(_) => ErrorKind::NotFound,
            PoolError::Storage(_) | PoolError::Io(_) | PoolError::Codec(_) | PoolError::Csv(_) => {
                ErrorKind::Storage
            }
            #[cfg(feature = "storage-rocksdb")]
            PoolError::Rocks(_) => ErrorKind::Storage,
        }
    }
}
