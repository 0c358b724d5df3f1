//! Error types for the inventory core

use thiserror::Error;

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Inventory errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Movement not found
    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    /// Outbound movement exceeds the current balance
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Quantity the caller asked to remove
        requested: i64,
        /// Balance on hand at the time of the check
        available: i64,
    },

    /// Operation would violate the ledger invariant
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Movement intent failed intake validation
    #[error("Invalid movement: {0}")]
    InvalidMovement(String),

    /// Product fields failed intake validation
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
