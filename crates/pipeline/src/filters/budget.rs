//! Filter that enforces the request budget.

use crate::context::RequestContext;
use crate::traits::CatalogFilter;
use anyhow::Result;
use catalog::CatalogItem;

/// Keeps items priced at or under the request budget
pub struct BudgetFilter;

impl CatalogFilter for BudgetFilter {
    fn name(&self) -> &str {
        "BudgetFilter"
    }

    fn apply<'a>(
        &self,
        items: Vec<&'a CatalogItem>,
        context: &RequestContext,
    ) -> Result<Vec<&'a CatalogItem>> {
        Ok(items
            .into_iter()
            .filter(|item| context.budget.allows(item.price))
            .collect())
    }
}
