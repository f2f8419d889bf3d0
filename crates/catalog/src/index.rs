//! Catalog building and indexing logic.
//!
//! This module builds a `Catalog` from parsed items:
//! - Validate ids and prices
//! - Sort items by id and index their positions
//! - Build the clothing type index

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

impl Catalog {
    /// Load a catalog from a file.
    ///
    /// `.json` files hold an array of items; anything else is parsed as a
    /// `::`-separated text catalog (see `parser`).
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CatalogError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let items: Vec<CatalogItem> = if is_json {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            parser::parse_catalog(path)?
        };

        let catalog = Self::from_items(items)?;
        info!(
            path = %path.display(),
            items = catalog.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from a list of items.
    ///
    /// Fails on duplicate ids and on prices that are negative or not finite.
    pub fn from_items(mut items: Vec<CatalogItem>) -> Result<Self> {
        validate(&items)?;

        items.sort_by_key(|item| item.id);
        Ok(Self::index(items))
    }

    /// The default catalog used when no catalog file is configured
    pub fn builtin() -> Self {
        let item = |id, clothing_type, colors: [&str; 3], brands: [&str; 2], price| CatalogItem {
            id,
            clothing_type,
            colors: colors.iter().map(|c| c.to_string()).collect(),
            brands: brands.iter().map(|b| b.to_string()).collect(),
            price,
        };

        let items = vec![
            item(1, ClothingType::Shirt, ["blue", "white", "black"], ["Nike", "Adidas"], 50.0),
            item(2, ClothingType::Pants, ["black", "blue", "grey"], ["Levi", "Gap"], 80.0),
            item(3, ClothingType::Shoes, ["black", "white", "grey"], ["Nike", "Puma"], 120.0),
            item(4, ClothingType::Jacket, ["black", "brown", "grey"], ["Zara", "H&M"], 150.0),
            item(5, ClothingType::Dress, ["red", "black", "white"], ["Forever21", "H&M"], 60.0),
        ];

        // Constant ids are unique and already sorted.
        Self::index(items)
    }

    /// Build the id and type indices over items already sorted by id
    fn index(items: Vec<CatalogItem>) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut type_index: HashMap<ClothingType, Vec<ItemId>> = HashMap::new();

        for (pos, item) in items.iter().enumerate() {
            by_id.insert(item.id, pos);
            type_index
                .entry(item.clothing_type)
                .or_default()
                .push(item.id);
        }

        Self {
            items,
            by_id,
            type_index,
        }
    }
}

/// Check ids are unique and prices usable
fn validate(items: &[CatalogItem]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(CatalogError::DuplicateId { id: item.id });
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(CatalogError::InvalidValue {
                field: "price".to_string(),
                value: item.price.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn shirt(id: ItemId, price: f64) -> CatalogItem {
        CatalogItem {
            id,
            clothing_type: ClothingType::Shirt,
            colors: vec!["blue".to_string()],
            brands: vec!["Nike".to_string()],
            price,
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.get_item(3).unwrap().clothing_type, ClothingType::Shoes);
        assert_eq!(catalog.get_item(4).unwrap().price, 150.0);
        assert_eq!(catalog.items_by_type(ClothingType::Dress), &[5]);
    }

    #[test]
    fn test_from_items_sorts_by_id() {
        let catalog = Catalog::from_items(vec![shirt(9, 10.0), shirt(2, 20.0), shirt(5, 30.0)]).unwrap();

        let ids: Vec<_> = catalog.items().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(catalog.get_item(5).unwrap().price, 30.0);
        assert_eq!(catalog.items_by_type(ClothingType::Shirt), &[2, 5, 9]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = Catalog::from_items(vec![shirt(1, 10.0), shirt(1, 20.0)]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { id: 1 }));
    }

    #[test]
    fn test_negative_or_nan_price_rejected() {
        assert!(Catalog::from_items(vec![shirt(1, -1.0)]).is_err());
        assert!(Catalog::from_items(vec![shirt(1, f64::NAN)]).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load_from_path(Path::new("does/not/exist.dat")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_text_and_json_catalogs() {
        let dir = tempfile::tempdir().unwrap();

        let dat_path = dir.path().join("catalog.dat");
        let mut dat = std::fs::File::create(&dat_path).unwrap();
        writeln!(dat, "2::pants::black::Levi::80").unwrap();
        writeln!(dat, "1::shirt::blue|white::Nike::50").unwrap();
        let from_dat = Catalog::load_from_path(&dat_path).unwrap();
        assert_eq!(from_dat.len(), 2);
        assert_eq!(from_dat.items()[0].id, 1);

        let json_path = dir.path().join("catalog.json");
        std::fs::write(
            &json_path,
            r#"[{"id": 7, "type": "dress", "colors": ["red"], "brands": ["H&M"], "price": 60.0}]"#,
        )
        .unwrap();
        let from_json = Catalog::load_from_path(&json_path).unwrap();
        assert_eq!(from_json.get_item(7).unwrap().clothing_type, ClothingType::Dress);
    }
}
