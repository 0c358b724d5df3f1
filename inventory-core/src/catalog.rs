//! Product catalog service
//!
//! CRUD over product records. The balance field is owned by the ledger
//! engine: products are created with zero stock (seed stock with an IN
//! movement) and the patch surface cannot touch `stock_quantity`.

use crate::{
    types::{NewProduct, Product, ProductId, ProductPatch},
    Result, Storage,
};
use chrono::Utc;
use rocksdb::{Transaction, TransactionDB};
use std::sync::Arc;

/// Product catalog
pub struct Catalog {
    /// Shared storage
    storage: Arc<Storage>,
}

impl Catalog {
    /// Create a catalog on shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Create a new product with a zero balance
    pub fn create_product(&self, new: NewProduct) -> Result<Product> {
        new.validate()?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            name: new.name,
            description: new.description,
            stock_quantity: 0,
            minimum_stock: new.minimum_stock,
            category: new.category,
            unit: new.unit,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.storage.put_product(&product)?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Get product by ID
    pub fn get_product(&self, id: ProductId) -> Result<Product> {
        self.storage.get_product(id)
    }

    /// All products, most recently created first
    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.storage.list_products()
    }

    /// Update product fields; the balance is not patchable here
    pub fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        patch.validate()?;

        let mut product = self.storage.get_product(id)?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(minimum_stock) = patch.minimum_stock {
            product.minimum_stock = minimum_stock;
        }
        if let Some(category) = patch.category {
            product.category = Some(category);
        }
        if let Some(unit) = patch.unit {
            product.unit = Some(unit);
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        self.storage.put_product(&product)?;

        Ok(product)
    }

    /// Delete a product and cascade-delete its movements.
    ///
    /// The store has no referential integrity, so the cascade runs
    /// explicitly inside one transaction: children first, then the parent.
    pub fn remove_product(&self, id: ProductId) -> Result<()> {
        let txn = self.storage.begin_transaction();
        let removed_movements = match self.apply_remove(&txn, id) {
            Ok(count) => {
                txn.commit()?;
                count
            }
            Err(err) => {
                let _ = txn.rollback();
                return Err(err);
            }
        };

        tracing::info!(
            product_id = %id,
            removed_movements,
            "Product removed"
        );
        Ok(())
    }

    fn apply_remove(&self, txn: &Transaction<'_, TransactionDB>, id: ProductId) -> Result<usize> {
        // Lock the parent row first; movement writers also take this lock,
        // so the index read below observes a stable movement set
        let product = self.storage.get_product_for_update(txn, id)?;

        let movements = self.storage.movements_for_product(product.id)?;
        for movement in &movements {
            self.storage.delete_movement_txn(txn, movement)?;
        }
        self.storage.delete_product_txn(txn, product.id)?;

        Ok(movements.len())
    }

    /// Active products in a category, by name
    pub fn products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut products = self.storage.list_products()?;
        products.retain(|p| p.is_active && p.category.as_deref() == Some(category));
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    /// Active products at or below their low-stock threshold, lowest
    /// balance first
    pub fn low_stock_products(&self) -> Result<Vec<Product>> {
        let mut products = self.storage.list_products()?;
        products.retain(|p| p.is_active && p.is_low_stock());
        products.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MovementType, NewMovement};
    use crate::{Config, Error, StockLedger};

    fn create_test_catalog() -> (Catalog, StockLedger, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let ledger = StockLedger::open(config).unwrap();
        let catalog = Catalog::new(ledger.storage());
        (catalog, ledger, temp_dir)
    }

    fn in_movement(product_id: ProductId, quantity: i64) -> NewMovement {
        NewMovement {
            movement_type: MovementType::In,
            quantity,
            product_id,
            description: None,
            reference: None,
        }
    }

    #[test]
    fn test_create_product_starts_with_zero_stock() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        let product = catalog.create_product(NewProduct::named("Bolts M6")).unwrap();
        assert_eq!(product.stock_quantity, 0);
        assert!(product.is_active);

        let retrieved = catalog.get_product(product.id).unwrap();
        assert_eq!(retrieved.name, "Bolts M6");
    }

    #[test]
    fn test_create_product_validates_fields() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        assert!(matches!(
            catalog.create_product(NewProduct::named("")),
            Err(Error::InvalidProduct(_))
        ));

        let mut over_long = NewProduct::named("x".repeat(101));
        over_long.minimum_stock = 5;
        assert!(matches!(
            catalog.create_product(over_long),
            Err(Error::InvalidProduct(_))
        ));
    }

    #[test]
    fn test_get_missing_product_fails() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        assert!(matches!(
            catalog.get_product(ProductId::generate()),
            Err(Error::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_update_product_merges_patch_only() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        let product = catalog
            .create_product(NewProduct {
                name: "Bolts M6".to_string(),
                description: Some("zinc plated".to_string()),
                minimum_stock: 10,
                category: Some("fasteners".to_string()),
                unit: Some("un".to_string()),
                is_active: true,
            })
            .unwrap();

        let updated = catalog
            .update_product(
                product.id,
                ProductPatch {
                    name: Some("Bolts M6 zinc".to_string()),
                    minimum_stock: Some(20),
                    is_active: Some(false),
                    ..ProductPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Bolts M6 zinc");
        assert_eq!(updated.minimum_stock, 20);
        assert!(!updated.is_active);
        // Untouched fields survive
        assert_eq!(updated.description.as_deref(), Some("zinc plated"));
        assert_eq!(updated.category.as_deref(), Some("fasteners"));
        assert_eq!(updated.stock_quantity, 0);
        assert!(updated.updated_at >= product.updated_at);
    }

    #[test]
    fn test_remove_product_cascades_to_movements() {
        let (catalog, ledger, _temp) = create_test_catalog();

        let product = catalog.create_product(NewProduct::named("Bolts M6")).unwrap();
        let other = catalog.create_product(NewProduct::named("Nuts M6")).unwrap();

        ledger.record_movement(in_movement(product.id, 10)).unwrap();
        ledger.record_movement(in_movement(product.id, 5)).unwrap();
        ledger.record_movement(in_movement(other.id, 7)).unwrap();

        catalog.remove_product(product.id).unwrap();

        assert!(matches!(
            catalog.get_product(product.id),
            Err(Error::ProductNotFound(_))
        ));
        assert!(ledger.movements_for_product(product.id).unwrap().is_empty());

        // The other product and its movement are untouched
        let survivors = ledger.movements().unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].product_id, other.id);
    }

    #[test]
    fn test_remove_missing_product_fails() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        assert!(matches!(
            catalog.remove_product(ProductId::generate()),
            Err(Error::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_products_by_category_filters_inactive() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        let mut bolts = NewProduct::named("Bolts M6");
        bolts.category = Some("fasteners".to_string());
        let mut nuts = NewProduct::named("Nuts M6");
        nuts.category = Some("fasteners".to_string());
        let mut retired = NewProduct::named("Anchors");
        retired.category = Some("fasteners".to_string());
        retired.is_active = false;
        let mut paint = NewProduct::named("Paint");
        paint.category = Some("finishes".to_string());

        catalog.create_product(nuts).unwrap();
        catalog.create_product(bolts).unwrap();
        catalog.create_product(retired).unwrap();
        catalog.create_product(paint).unwrap();

        let fasteners = catalog.products_by_category("fasteners").unwrap();
        assert_eq!(fasteners.len(), 2);
        // Ordered by name
        assert_eq!(fasteners[0].name, "Bolts M6");
        assert_eq!(fasteners[1].name, "Nuts M6");
    }

    #[test]
    fn test_low_stock_report() {
        let (catalog, ledger, _temp) = create_test_catalog();

        let mut low = NewProduct::named("Bolts M6");
        low.minimum_stock = 10;
        let low = catalog.create_product(low).unwrap();
        ledger.record_movement(in_movement(low.id, 5)).unwrap();

        let mut lower = NewProduct::named("Nuts M6");
        lower.minimum_stock = 10;
        let lower = catalog.create_product(lower).unwrap();
        ledger.record_movement(in_movement(lower.id, 2)).unwrap();

        let mut healthy = NewProduct::named("Washers M6");
        healthy.minimum_stock = 10;
        let healthy = catalog.create_product(healthy).unwrap();
        ledger.record_movement(in_movement(healthy.id, 50)).unwrap();

        let report = catalog.low_stock_products().unwrap();
        assert_eq!(report.len(), 2);
        // Lowest balance first
        assert_eq!(report[0].id, lower.id);
        assert_eq!(report[1].id, low.id);
    }

    #[test]
    fn test_list_products_newest_first() {
        let (catalog, _ledger, _temp) = create_test_catalog();

        catalog.create_product(NewProduct::named("First")).unwrap();
        catalog.create_product(NewProduct::named("Second")).unwrap();
        catalog.create_product(NewProduct::named("Third")).unwrap();

        let products = catalog.list_products().unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].name, "Third");
        assert_eq!(products[2].name, "First");
    }
}
