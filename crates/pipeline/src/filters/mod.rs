//! Filter implementations for the catalog pipeline.

pub mod budget;
pub mod exclude_types;

// Re-export for convenience
pub use budget::BudgetFilter;
pub use exclude_types::ExcludeTypesFilter;
