//! Storage layer using RocksDB
//!
//! The store is a pessimistic `TransactionDB`: `get_for_update` takes an
//! exclusive per-key lock that is held until commit or rollback, which is
//! what serializes concurrent read-modify-write cycles on the same product
//! row while leaving other products fully parallel. Dropping an uncommitted
//! transaction rolls it back.
//!
//! # Column Families
//!
//! - `products` - Product records (key: product_id)
//! - `movements` - Movement records (key: movement_id, UUIDv7 so keys are
//!   time-ordered)
//! - `indices` - Secondary index (key: product_id || movement_id)

use crate::{
    error::{Error, Result},
    types::{Movement, MovementId, Product, ProductId, TimeRange},
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    Transaction, TransactionDB, TransactionDBOptions,
};
use std::sync::Arc;

/// Column family names
const CF_PRODUCTS: &str = "products";
const CF_MOVEMENTS: &str = "movements";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<TransactionDB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-heavy movement log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        // Enable statistics
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        // Lock waits bounded so a stuck writer surfaces as a storage error
        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(config.transactions.lock_timeout_ms);
        txn_db_opts.set_default_lock_timeout(config.transactions.lock_timeout_ms);

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_PRODUCTS, Self::cf_options_products()),
            ColumnFamilyDescriptor::new(CF_MOVEMENTS, Self::cf_options_movements()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        // Open database
        let db = TransactionDB::open_cf_descriptors(&db_opts, &txn_db_opts, path, cf_descriptors)?;

        tracing::info!("Opened transactional RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_products() -> Options {
        let mut opts = Options::default();
        // Products are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_movements() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Begin a transaction.
    ///
    /// Commit consumes the transaction; on every other exit path the drop
    /// guard rolls it back, so the lock resource is always released.
    pub fn begin_transaction(&self) -> Transaction<'_, TransactionDB> {
        self.db.transaction()
    }

    // Product operations

    /// Get product by ID
    pub fn get_product(&self, id: ProductId) -> Result<Product> {
        let cf = self.cf_handle(CF_PRODUCTS)?;

        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::ProductNotFound(id.to_string()))?;

        let product: Product = bincode::deserialize(&value)?;
        Ok(product)
    }

    /// Put product (unscoped write)
    pub fn put_product(&self, product: &Product) -> Result<()> {
        let cf = self.cf_handle(CF_PRODUCTS)?;
        let value = bincode::serialize(product)?;

        self.db.put_cf(cf, product.id.as_bytes(), &value)?;

        Ok(())
    }

    /// Get product by ID inside a transaction, taking an exclusive lock on
    /// its row until the transaction commits or rolls back
    pub fn get_product_for_update(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        id: ProductId,
    ) -> Result<Product> {
        let cf = self.cf_handle(CF_PRODUCTS)?;

        let value = txn
            .get_for_update_cf(cf, id.as_bytes(), true)?
            .ok_or_else(|| Error::ProductNotFound(id.to_string()))?;

        let product: Product = bincode::deserialize(&value)?;
        Ok(product)
    }

    /// Put product inside a transaction
    pub fn put_product_txn(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        product: &Product,
    ) -> Result<()> {
        let cf = self.cf_handle(CF_PRODUCTS)?;
        let value = bincode::serialize(product)?;

        txn.put_cf(cf, product.id.as_bytes(), &value)?;

        Ok(())
    }

    /// Delete product inside a transaction
    pub fn delete_product_txn(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        id: ProductId,
    ) -> Result<()> {
        let cf = self.cf_handle(CF_PRODUCTS)?;
        txn.delete_cf(cf, id.as_bytes())?;
        Ok(())
    }

    /// All products, most recently created first
    pub fn list_products(&self) -> Result<Vec<Product>> {
        let cf = self.cf_handle(CF_PRODUCTS)?;

        let mut products = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let product: Product = bincode::deserialize(&value)?;
            products.push(product);
        }

        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    // Movement operations

    /// Get movement by ID
    pub fn get_movement(&self, id: MovementId) -> Result<Movement> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;

        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::MovementNotFound(id.to_string()))?;

        let movement: Movement = bincode::deserialize(&value)?;
        Ok(movement)
    }

    /// Get movement by ID inside a transaction, taking an exclusive lock
    pub fn get_movement_for_update(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        id: MovementId,
    ) -> Result<Movement> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;

        let value = txn
            .get_for_update_cf(cf, id.as_bytes(), true)?
            .ok_or_else(|| Error::MovementNotFound(id.to_string()))?;

        let movement: Movement = bincode::deserialize(&value)?;
        Ok(movement)
    }

    /// Put movement and its product index entry inside a transaction
    pub fn put_movement_txn(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        movement: &Movement,
    ) -> Result<()> {
        let cf_movements = self.cf_handle(CF_MOVEMENTS)?;
        let value = bincode::serialize(movement)?;
        txn.put_cf(cf_movements, movement.id.as_bytes(), &value)?;

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx = Self::index_key_product_movement(movement.product_id, Some(movement.id));
        txn.put_cf(cf_indices, &idx, &[])?;

        Ok(())
    }

    /// Overwrite a movement record (metadata updates; the index key does
    /// not change)
    pub fn put_movement(&self, movement: &Movement) -> Result<()> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;
        let value = bincode::serialize(movement)?;

        self.db.put_cf(cf, movement.id.as_bytes(), &value)?;

        Ok(())
    }

    /// Delete movement and its index entry inside a transaction
    pub fn delete_movement_txn(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        movement: &Movement,
    ) -> Result<()> {
        let cf_movements = self.cf_handle(CF_MOVEMENTS)?;
        txn.delete_cf(cf_movements, movement.id.as_bytes())?;

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx = Self::index_key_product_movement(movement.product_id, Some(movement.id));
        txn.delete_cf(cf_indices, &idx)?;

        Ok(())
    }

    /// Movements with `created_at` inside the range, most recent first
    pub fn movements_in_range(&self, range: &TimeRange) -> Result<Vec<Movement>> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;

        let mut movements = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_, value) = item?;
            let movement: Movement = bincode::deserialize(&value)?;
            if range.contains(movement.created_at) {
                movements.push(movement);
            }
        }

        // Keys are UUIDv7 and therefore time-ordered, but ordering is
        // guaranteed on the exact timestamp
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(movements)
    }

    /// All movements, most recent first
    pub fn movements(&self) -> Result<Vec<Movement>> {
        self.movements_in_range(&TimeRange::default())
    }

    /// Movements for one product (via index), most recent first.
    ///
    /// Movement writers hold the product row lock while inserting index
    /// entries, so reads made under that same lock observe a stable index.
    pub fn movements_for_product(&self, product_id: ProductId) -> Result<Vec<Movement>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        // Scan index: product_id || movement_id
        let prefix = Self::index_key_product_movement(product_id, None);
        let iter = self
            .db
            .iterator_cf(cf_indices, IteratorMode::From(&prefix, Direction::Forward));

        let mut movements = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }

            // Extract movement_id from key (bytes 16..32)
            if key.len() >= 32 {
                let movement_id_bytes: [u8; 16] =
                    key[16..32].try_into().expect("index key is 32 bytes");
                let movement_id = MovementId::from_bytes(movement_id_bytes);

                let movement = self.get_movement(movement_id)?;
                movements.push(movement);
            }
        }

        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(movements)
    }

    // Index key helpers

    fn index_key_product_movement(
        product_id: ProductId,
        movement_id: Option<MovementId>,
    ) -> Vec<u8> {
        let mut key = product_id.as_bytes().to_vec();
        if let Some(mid) = movement_id {
            key.extend_from_slice(mid.as_bytes());
        }
        key
    }

    // Statistics

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats> {
        let cf_products = self.cf_handle(CF_PRODUCTS)?;
        let cf_movements = self.cf_handle(CF_MOVEMENTS)?;

        let mut product_count = 0u64;
        for item in self.db.iterator_cf(cf_products, IteratorMode::Start) {
            item?;
            product_count += 1;
        }

        let mut movement_count = 0u64;
        for item in self.db.iterator_cf(cf_movements, IteratorMode::Start) {
            item?;
            movement_count += 1;
        }

        Ok(StorageStats {
            total_products: product_count,
            total_movements: movement_count,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Number of product records
    pub total_products: u64,

    /// Number of movement records
    pub total_movements: u64,
}
