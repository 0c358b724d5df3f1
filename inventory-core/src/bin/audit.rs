//! Stock audit binary
//!
//! Opens the store, verifies the ledger invariant for every product and
//! prints a low-stock report. Exits non-zero if any product balance
//! disagrees with its movement history.

use inventory_core::{Catalog, Config, StockLedger};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load configuration: explicit file argument, else environment
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    tracing::info!("Starting stock audit");

    let ledger = StockLedger::open(config)?;
    let catalog = Catalog::new(ledger.storage());

    let stats = ledger.storage().stats()?;
    tracing::info!(
        products = stats.total_products,
        movements = stats.total_movements,
        "Store opened"
    );

    let mut violations = 0usize;
    for product in catalog.list_products()? {
        if ledger.check_stock_invariant(product.id)? {
            tracing::debug!(
                product_id = %product.id,
                name = %product.name,
                balance = product.stock_quantity,
                "Balance consistent"
            );
        } else {
            violations += 1;
            tracing::error!(
                product_id = %product.id,
                name = %product.name,
                balance = product.stock_quantity,
                "Balance disagrees with movement history"
            );
        }
    }

    for product in catalog.low_stock_products()? {
        tracing::warn!(
            product_id = %product.id,
            name = %product.name,
            balance = product.stock_quantity,
            minimum = product.minimum_stock,
            "Low stock"
        );
    }

    if violations > 0 {
        return Err(format!("{} product(s) violate the stock invariant", violations).into());
    }

    tracing::info!("Audit complete, all balances consistent");
    Ok(())
}
