//! Body shape classification and recommendation ranking.
//!
//! This crate provides:
//! - `classify_body_shape` for turning pose keypoints into a shape and advice
//! - CatalogFilter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - MatchScorer and the Affinity implementations
//! - RecommendationEngine, which ties filtering, scoring and ranking together
//!
//! ## Architecture
//! A recommendation request is processed in stages:
//! 1. Filters remove catalog items the request cannot use (over budget, excluded types)
//! 2. MatchScorer scores the survivors in parallel
//! 3. The engine ranks by score and caps the list
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{RecommendationEngine, SeededAffinity, StylePreference};
//!
//! let engine = RecommendationEngine::new(catalog.clone(), Arc::new(SeededAffinity::new(42)));
//! let style = StylePreference::from_names(["shirt", "shoes"]);
//!
//! let recs = engine.generate_recommendations(&detected, Some(&style), 150.0)?;
//! ```

pub mod body_shape;
pub mod context;
pub mod error;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod scoring;
pub mod recommend;

// Re-export main types
pub use body_shape::{classify_body_shape, BodyShape, BodyShapeResult};
pub use context::{Budget, RequestContext, StylePreference};
pub use error::RecommendError;
pub use filter_pipeline::FilterPipeline;
pub use recommend::{Recommendation, RecommendationEngine, MAX_RECOMMENDATIONS};
pub use scoring::{Affinity, FixedAffinity, MatchScorer, SeededAffinity};
pub use traits::CatalogFilter;
