//! Core domain types for the clothing catalog.
//!
//! This module defines the data structures shared by every stage of the
//! recommendation pipeline:
//! - `ClothingType`, the canonical category of a detected or cataloged item
//! - `CatalogItem`, one purchasable piece of clothing
//! - `Catalog`, the immutable in-memory store of all items

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a catalog item
pub type ItemId = u32;

// =============================================================================
// Clothing Types
// =============================================================================

/// Canonical clothing category.
///
/// Detector labels, catalog entries and user style preferences all end up
/// as one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingType {
    Shirt,
    Pants,
    Shoes,
    Jacket,
    Dress,
    Accessories,
    Unknown,
}

impl ClothingType {
    /// Every category, in declaration order
    pub const ALL: [ClothingType; 7] = [
        ClothingType::Shirt,
        ClothingType::Pants,
        ClothingType::Shoes,
        ClothingType::Jacket,
        ClothingType::Dress,
        ClothingType::Accessories,
        ClothingType::Unknown,
    ];

    /// Lowercase canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingType::Shirt => "shirt",
            ClothingType::Pants => "pants",
            ClothingType::Shoes => "shoes",
            ClothingType::Jacket => "jacket",
            ClothingType::Dress => "dress",
            ClothingType::Accessories => "accessories",
            ClothingType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClothingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a clothing type name (case-insensitive).
///
/// Besides the canonical names a few everyday aliases are accepted, so a
/// style preference of "boots" or "coat" still means something.
impl FromStr for ClothingType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shirt" | "shirts" | "top" | "tops" => Ok(ClothingType::Shirt),
            "pants" | "trousers" | "jeans" => Ok(ClothingType::Pants),
            "shoes" | "shoe" | "boot" | "boots" | "sneakers" => Ok(ClothingType::Shoes),
            "jacket" | "jackets" | "coat" | "coats" => Ok(ClothingType::Jacket),
            "dress" | "dresses" => Ok(ClothingType::Dress),
            "accessories" | "accessory" | "hat" | "hats" => Ok(ClothingType::Accessories),
            "unknown" => Ok(ClothingType::Unknown),
            _ => Err(CatalogError::InvalidValue {
                field: "type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Catalog Items
// =============================================================================

/// A purchasable clothing item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    pub colors: Vec<String>,
    pub brands: Vec<String>,
    /// Price in the catalog's currency, always finite and non-negative
    pub price: f64,
}

// =============================================================================
// Catalog - The Immutable Item Store
// =============================================================================

/// Main data structure holding every candidate item.
///
/// A catalog is built once (see `Catalog::from_items`, `Catalog::builtin`
/// and `Catalog::load_from_path`) and never mutated afterwards. Share it
/// between requests with an `Arc<Catalog>`.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Items sorted by id
    pub(crate) items: Vec<CatalogItem>,
    /// Position of each item in `items`
    pub(crate) by_id: HashMap<ItemId, usize>,
    /// Item ids grouped by clothing type (ascending ids)
    pub(crate) type_index: HashMap<ClothingType, Vec<ItemId>>,
}

impl Catalog {
    /// Get an item by id
    pub fn get_item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.by_id.get(&id).map(|&pos| &self.items[pos])
    }

    /// All items, in ascending id order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Ids of all items of one clothing type
    pub fn items_by_type(&self, clothing_type: ClothingType) -> &[ItemId] {
        self.type_index
            .get(&clothing_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
