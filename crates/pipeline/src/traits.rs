//! Core traits for the filtering pipeline.
//!
//! This module defines the CatalogFilter trait that allows composable,
//! extensible filters to be applied to the candidate catalog items.

use crate::context::RequestContext;
use anyhow::Result;
use catalog::CatalogItem;

/// Core trait for filtering catalog items.
///
/// ## Design Note
/// - `Send + Sync` so one pipeline serves concurrent requests
/// - Filters take ownership of the candidate list and return the survivors
/// - Candidates are borrowed from the shared catalog, never cloned
pub trait CatalogFilter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `items` - The candidates to filter (takes ownership)
    /// * `context` - Budget, style and detections for this request
    fn apply<'a>(
        &self,
        items: Vec<&'a CatalogItem>,
        context: &RequestContext,
    ) -> Result<Vec<&'a CatalogItem>>;
}
