//! The FilterPipeline chains multiple filters.

use crate::context::RequestContext;
use crate::error::{RecommendError, Result};
use crate::traits::CatalogFilter;
use catalog::CatalogItem;
use tracing::debug;

/// Chains filters into one processing stage (builder pattern).
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(BudgetFilter)
///     .add_filter(ExcludeTypesFilter::new([ClothingType::Accessories]));
///
/// let survivors = pipeline.apply(catalog.items().iter().collect(), &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn CatalogFilter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: impl CatalogFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence; the first failure stops the pipeline
    pub fn apply<'a>(
        &self,
        items: Vec<&'a CatalogItem>,
        context: &RequestContext,
    ) -> Result<Vec<&'a CatalogItem>> {
        let mut current = items;
        for filter in &self.filters {
            let before = current.len();
            current = filter
                .apply(current, context)
                .map_err(|source| RecommendError::Filter {
                    filter: filter.name().to_string(),
                    source,
                })?;
            debug!("{}: {} -> {} items", filter.name(), before, current.len());
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
