//! Core types for the inventory ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (integer quantities)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a product name
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a product category
pub const MAX_CATEGORY_LEN: usize = 50;
/// Maximum length of a product unit label
pub const MAX_UNIT_LEN: usize = 20;
/// Maximum length of a movement reference
pub const MAX_REFERENCE_LEN: usize = 100;

/// Product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Generate a fresh product id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Raw bytes, used as the storage key
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Movement identifier (UUIDv7 for time-ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

impl MovementId {
    /// Generate a fresh, time-ordered movement id
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Raw bytes, used as the storage key
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Reconstruct from raw storage-key bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    /// Inbound movement, adds to stock
    In,
    /// Outbound movement, subtracts from stock
    Out,
}

impl MovementType {
    /// Signed effect of a movement of this type on a product balance.
    ///
    /// This is the single place where the sign convention lives. The
    /// reversal applied when a movement is removed is the negation of
    /// this value.
    pub fn signed_delta(self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }

    /// Wire/report code
    pub fn code(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }

    /// Parse from code
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementType::In),
            "OUT" => Some(MovementType::Out),
            _ => None,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Catalog product with its authoritative balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Current balance; always equals the signed sum of this product's
    /// movements when observed outside an in-flight transaction
    pub stock_quantity: i64,

    /// Low-stock threshold
    pub minimum_stock: i64,

    /// Optional category label
    pub category: Option<String>,

    /// Optional unit label (kg, un, l, ...)
    pub unit: Option<String>,

    /// Inactive products are hidden from catalog reports
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Low-stock classification: balance at or below the threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.minimum_stock
    }
}

/// A single recorded stock change tied to one product.
///
/// `movement_type` and `quantity` are immutable after creation; they have
/// already been folded into the product balance, so editing them without a
/// corresponding balance adjustment would break the ledger invariant. Only
/// `description` and `reference` may be edited post-creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement ID
    pub id: MovementId,

    /// Direction of the movement
    pub movement_type: MovementType,

    /// Quantity moved (always positive; direction comes from the type)
    pub quantity: i64,

    /// Optional free-text description
    pub description: Option<String>,

    /// Optional external reference (order number, invoice, ...)
    pub reference: Option<String>,

    /// Owning product
    pub product_id: ProductId,

    /// Server-assigned creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Signed effect this movement had on its product balance
    pub fn stock_change(&self) -> i64 {
        self.movement_type.signed_delta(self.quantity)
    }
}

/// Intent to record a new movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    /// Direction of the movement
    pub movement_type: MovementType,

    /// Quantity moved (must be positive)
    pub quantity: i64,

    /// Owning product
    pub product_id: ProductId,

    /// Optional free-text description
    pub description: Option<String>,

    /// Optional external reference
    pub reference: Option<String>,
}

impl NewMovement {
    /// Defensive intake validation
    pub fn validate(&self) -> crate::Result<()> {
        if self.quantity <= 0 {
            return Err(crate::Error::InvalidMovement(
                "Quantity must be positive".to_string(),
            ));
        }
        if let Some(ref reference) = self.reference {
            if reference.len() > MAX_REFERENCE_LEN {
                return Err(crate::Error::InvalidMovement(format!(
                    "Reference exceeds {} characters",
                    MAX_REFERENCE_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Metadata-only movement patch; type, quantity and product are not accepted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementPatch {
    /// New description, if provided
    pub description: Option<String>,

    /// New reference, if provided
    pub reference: Option<String>,
}

impl MovementPatch {
    /// Defensive intake validation
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(ref reference) = self.reference {
            if reference.len() > MAX_REFERENCE_LEN {
                return Err(crate::Error::InvalidMovement(format!(
                    "Reference exceeds {} characters",
                    MAX_REFERENCE_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Intent to create a new product.
///
/// Products always start with a zero balance; initial stock is seeded with
/// an IN movement so the ledger invariant holds from the first write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name (required)
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Low-stock threshold
    pub minimum_stock: i64,

    /// Optional category label
    pub category: Option<String>,

    /// Optional unit label
    pub unit: Option<String>,

    /// Whether the product is active on creation
    pub is_active: bool,
}

impl NewProduct {
    /// New product intent with catalog defaults
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            minimum_stock: 0,
            category: None,
            unit: None,
            is_active: true,
        }
    }

    /// Defensive intake validation
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::InvalidProduct(
                "Name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(crate::Error::InvalidProduct(format!(
                "Name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.minimum_stock < 0 {
            return Err(crate::Error::InvalidProduct(
                "Minimum stock must not be negative".to_string(),
            ));
        }
        if let Some(ref category) = self.category {
            if category.len() > MAX_CATEGORY_LEN {
                return Err(crate::Error::InvalidProduct(format!(
                    "Category exceeds {} characters",
                    MAX_CATEGORY_LEN
                )));
            }
        }
        if let Some(ref unit) = self.unit {
            if unit.len() > MAX_UNIT_LEN {
                return Err(crate::Error::InvalidProduct(format!(
                    "Unit exceeds {} characters",
                    MAX_UNIT_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Partial product update; the balance is owned by the ledger engine and
/// cannot be patched here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    /// New name, if provided
    pub name: Option<String>,

    /// New description, if provided
    pub description: Option<String>,

    /// New low-stock threshold, if provided
    pub minimum_stock: Option<i64>,

    /// New category, if provided
    pub category: Option<String>,

    /// New unit label, if provided
    pub unit: Option<String>,

    /// New active flag, if provided
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Defensive intake validation
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(crate::Error::InvalidProduct(
                    "Name must not be empty".to_string(),
                ));
            }
            if name.len() > MAX_NAME_LEN {
                return Err(crate::Error::InvalidProduct(format!(
                    "Name exceeds {} characters",
                    MAX_NAME_LEN
                )));
            }
        }
        if let Some(minimum_stock) = self.minimum_stock {
            if minimum_stock < 0 {
                return Err(crate::Error::InvalidProduct(
                    "Minimum stock must not be negative".to_string(),
                ));
            }
        }
        if let Some(ref category) = self.category {
            if category.len() > MAX_CATEGORY_LEN {
                return Err(crate::Error::InvalidProduct(format!(
                    "Category exceeds {} characters",
                    MAX_CATEGORY_LEN
                )));
            }
        }
        if let Some(ref unit) = self.unit {
            if unit.len() > MAX_UNIT_LEN {
                return Err(crate::Error::InvalidProduct(format!(
                    "Unit exceeds {} characters",
                    MAX_UNIT_LEN
                )));
            }
        }
        Ok(())
    }
}

/// A movement joined with its owning product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementWithProduct {
    /// The movement record
    pub movement: Movement,

    /// The owning product as of the read
    pub product: Product,
}

/// Creation-timestamp range filter (inclusive bounds, both optional)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive lower bound
    pub start: Option<DateTime<Utc>>,

    /// Inclusive upper bound
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Whether `at` falls inside this range
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > end {
                return false;
            }
        }
        true
    }
}
