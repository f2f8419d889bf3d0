//! Filter that suppresses whole clothing categories.

use crate::context::RequestContext;
use crate::traits::CatalogFilter;
use anyhow::Result;
use catalog::{CatalogItem, ClothingType};
use std::collections::HashSet;

/// Removes items of the excluded types
pub struct ExcludeTypesFilter {
    excluded: HashSet<ClothingType>,
}

impl ExcludeTypesFilter {
    pub fn new(excluded: impl IntoIterator<Item = ClothingType>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }
}

impl CatalogFilter for ExcludeTypesFilter {
    fn name(&self) -> &str {
        "ExcludeTypesFilter"
    }

    fn apply<'a>(
        &self,
        items: Vec<&'a CatalogItem>,
        _context: &RequestContext,
    ) -> Result<Vec<&'a CatalogItem>> {
        Ok(items
            .into_iter()
            .filter(|item| !self.excluded.contains(&item.clothing_type))
            .collect())
    }
}
