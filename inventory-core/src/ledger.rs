//! Stock ledger engine
//!
//! The only component allowed to mutate a product balance, and it does so
//! exclusively in lock-step with a movement create or delete, inside one
//! storage transaction. Consistency under concurrent callers is delegated
//! entirely to the storage layer's pessimistic row locks; the engine holds
//! no in-process locks of its own.
//!
//! # Example
//!
//! ```no_run
//! use inventory_core::{Config, StockLedger};
//!
//! fn main() -> inventory_core::Result<()> {
//!     let config = Config::default();
//!     let ledger = StockLedger::open(config)?;
//!
//!     // Record a movement
//!     // let created = ledger.record_movement(intent)?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    metrics::Metrics,
    summary::{self, MovementSummary},
    types::{
        Movement, MovementId, MovementPatch, MovementType, MovementWithProduct, NewMovement,
        TimeRange,
    },
    Error, ProductId, Result, Storage,
};
use chrono::Utc;
use rocksdb::{Transaction, TransactionDB};
use std::sync::Arc;
use std::time::Instant;

/// Stock ledger engine
pub struct StockLedger {
    /// Shared storage
    storage: Arc<Storage>,

    /// Prometheus instrumentation
    metrics: Metrics,
}

impl StockLedger {
    /// Open the ledger with configuration
    pub fn open(config: crate::Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        Self::with_storage(storage)
    }

    /// Build a ledger on already-opened storage
    pub fn with_storage(storage: Arc<Storage>) -> Result<Self> {
        let metrics = Metrics::new()?;
        Ok(Self { storage, metrics })
    }

    /// Shared storage handle (for wiring up the catalog)
    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Metrics registry holder
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Record a new movement and apply its effect to the product balance.
    ///
    /// Runs as a single storage transaction: the product row is locked,
    /// the balance re-validated, and the movement row plus the updated
    /// balance are committed together. On any failure nothing survives.
    pub fn record_movement(&self, intent: NewMovement) -> Result<MovementWithProduct> {
        intent.validate()?;
        let started = Instant::now();

        let txn = self.storage.begin_transaction();
        let movement = match self.apply_record(&txn, &intent) {
            Ok(movement) => {
                txn.commit()?;
                movement
            }
            Err(err) => {
                if matches!(err, Error::InsufficientStock { .. }) {
                    self.metrics.record_insufficient_stock();
                }
                let _ = txn.rollback();
                return Err(err);
            }
        };

        self.metrics.record_movement_recorded();
        self.metrics
            .record_apply_duration(started.elapsed().as_secs_f64());

        tracing::debug!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            "Movement recorded"
        );

        // Read-after-write with the owning product attached; the data is
        // committed, so this read runs outside the transaction
        self.get_movement(movement.id)
    }

    fn apply_record(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        intent: &NewMovement,
    ) -> Result<Movement> {
        // Locks the product row until commit or rollback
        let mut product = self.storage.get_product_for_update(txn, intent.product_id)?;

        let stock_change = intent.movement_type.signed_delta(intent.quantity);

        // Outbound movements must never drive the balance negative
        if intent.movement_type == MovementType::Out && product.stock_quantity < intent.quantity {
            return Err(Error::InsufficientStock {
                requested: intent.quantity,
                available: product.stock_quantity,
            });
        }

        let now = Utc::now();
        let movement = Movement {
            id: MovementId::generate(),
            movement_type: intent.movement_type,
            quantity: intent.quantity,
            description: intent.description.clone(),
            reference: intent.reference.clone(),
            product_id: intent.product_id,
            created_at: now,
        };
        self.storage.put_movement_txn(txn, &movement)?;

        product.stock_quantity += stock_change;
        product.updated_at = now;
        self.storage.put_product_txn(txn, &product)?;

        Ok(movement)
    }

    /// Remove a movement, reversing its effect on the product balance.
    pub fn remove_movement(&self, id: MovementId) -> Result<()> {
        let started = Instant::now();

        let txn = self.storage.begin_transaction();
        match self.apply_remove(&txn, id) {
            Ok(()) => {
                txn.commit()?;
            }
            Err(err) => {
                let _ = txn.rollback();
                return Err(err);
            }
        }

        self.metrics.record_movement_reversed();
        self.metrics
            .record_apply_duration(started.elapsed().as_secs_f64());

        tracing::debug!(movement_id = %id, "Movement removed");
        Ok(())
    }

    fn apply_remove(&self, txn: &Transaction<'_, TransactionDB>, id: MovementId) -> Result<()> {
        let movement = self.storage.get_movement_for_update(txn, id)?;
        let mut product = self
            .storage
            .get_product_for_update(txn, movement.product_id)?;

        // Reversal is the negation of the original effect. The guard can
        // only trip after concurrent balance changes since the forward
        // operation was validated at creation time; it stays as an
        // invariant check.
        let stock_change = -movement.stock_change();
        if product.stock_quantity + stock_change < 0 {
            return Err(Error::InvalidOperation(format!(
                "Removing movement {} would make stock negative",
                id
            )));
        }

        product.stock_quantity += stock_change;
        product.updated_at = Utc::now();
        self.storage.put_product_txn(txn, &product)?;
        self.storage.delete_movement_txn(txn, &movement)?;

        Ok(())
    }

    /// Update movement metadata (description/reference only).
    ///
    /// Type, quantity and product are immutable: they are already folded
    /// into the product balance. No balance interaction, so this is a
    /// plain store write.
    pub fn update_movement_metadata(
        &self,
        id: MovementId,
        patch: MovementPatch,
    ) -> Result<Movement> {
        patch.validate()?;

        let mut movement = self.storage.get_movement(id)?;
        if let Some(description) = patch.description {
            movement.description = Some(description);
        }
        if let Some(reference) = patch.reference {
            movement.reference = Some(reference);
        }
        self.storage.put_movement(&movement)?;

        Ok(movement)
    }

    /// Get a movement joined with its owning product
    pub fn get_movement(&self, id: MovementId) -> Result<MovementWithProduct> {
        let movement = self.storage.get_movement(id)?;
        let product = self.storage.get_product(movement.product_id)?;
        Ok(MovementWithProduct { movement, product })
    }

    /// All movements, most recent first
    pub fn movements(&self) -> Result<Vec<Movement>> {
        self.storage.movements()
    }

    /// Movements for one product, most recent first
    pub fn movements_for_product(&self, product_id: ProductId) -> Result<Vec<Movement>> {
        self.storage.movements_for_product(product_id)
    }

    /// Movements of one type, most recent first
    pub fn movements_by_type(&self, movement_type: MovementType) -> Result<Vec<Movement>> {
        let mut movements = self.storage.movements()?;
        movements.retain(|m| m.movement_type == movement_type);
        Ok(movements)
    }

    /// Summarize movements inside an optional creation-timestamp range
    pub fn summarize(&self, range: TimeRange) -> Result<MovementSummary> {
        let movements = self.storage.movements_in_range(&range)?;
        Ok(summary::summarize(movements))
    }

    /// Check the ledger invariant for one product.
    ///
    /// Verify that the stored balance equals the signed sum of the
    /// product's movements. This is the critical invariant for stock
    /// correctness.
    pub fn check_stock_invariant(&self, product_id: ProductId) -> Result<bool> {
        let product = self.storage.get_product(product_id)?;
        let movements = self.storage.movements_for_product(product_id)?;

        let net: i64 = movements.iter().map(Movement::stock_change).sum();

        Ok(product.stock_quantity == net)
    }
}
