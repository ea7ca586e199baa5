use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Merchant,
    Customer,
    Invoice,
    Payment,
    Authorization,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Merchant => "merchant",
            Entity::Customer => "customer",
            Entity::Invoice => "invoice",
            Entity::Payment => "payment",
            Entity::Authorization => "authorization",
        };
        f.write_str(name)
    }
}

/// The four failure kinds a caller can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    CurrencyNotAllowed,
    InternalError,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },
    #[error("Currency {currency} is not allowed for merchant {merchant_id}")]
    CurrencyNotAllowed { merchant_id: u64, currency: String },
    #[error("{context}: {source}")]
    InternalError {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Authorization cancelled before the payment network responded")]
    Cancelled,
    #[error("Authorization timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
}

impl PaymentError {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps a lower-level failure with the workflow step that hit it.
    pub fn internal(context: impl Into<String>, source: PaymentError) -> Self {
        Self::InternalError {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            PaymentError::NotFound { .. } => ErrorKind::NotFound,
            PaymentError::CurrencyNotAllowed { .. } => ErrorKind::CurrencyNotAllowed,
            _ => ErrorKind::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
