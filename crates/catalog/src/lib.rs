//! # Catalog Crate
//!
//! This crate holds the store of candidate clothing items the recommendation
//! engine ranks.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (ClothingType, CatalogItem, Catalog)
//! - **parser**: Parse `::`-separated catalog files
//! - **index**: Build, validate and index a catalog
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Catalog, ClothingType};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_path(Path::new("data/catalog.dat"))?;
//!
//! let shirts = catalog.items_by_type(ClothingType::Shirt);
//! println!("{} of {} items are shirts", shirts.len(), catalog.len());
//! ```
//!
//! A catalog is immutable once built; share it with `Arc<Catalog>`.

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{Catalog, CatalogItem, ClothingType, ItemId};
