//! Stockbook Inventory Core
//!
//! Product catalog plus a ledger of stock movements that keeps each
//! product's on-hand quantity consistent.
//!
//! # Architecture
//!
//! - **Authoritative balance**: each product carries its current
//!   `stock_quantity`; every mutation happens in lock-step with a movement
//!   create or delete inside one storage transaction
//! - **Row-level locking**: concurrent writers on the same product are
//!   serialized by the store's pessimistic per-key locks; different
//!   products proceed in parallel
//! - **No partial states**: a movement row without its balance update (or
//!   vice versa) is never observable
//!
//! # Invariants
//!
//! - Stock conservation: balance == Σ(IN quantities) − Σ(OUT quantities)
//!   for every product, observed outside an in-flight transaction
//! - Non-negativity: balances never drop below zero
//! - Movement immutability: type and quantity never change after creation;
//!   only description/reference metadata may be edited

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod summary;
pub mod types;

// Re-exports
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::StockLedger;
pub use metrics::Metrics;
pub use storage::{Storage, StorageStats};
pub use summary::{summarize, MovementSummary};
pub use types::{
    Movement, MovementId, MovementPatch, MovementType, MovementWithProduct, NewMovement,
    NewProduct, Product, ProductId, ProductPatch, TimeRange,
};
