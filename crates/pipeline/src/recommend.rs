//! # Recommendation Engine
//!
//! Ranks catalog items for one request:
//! 1. Filter: the `FilterPipeline` (budget first, inclusive)
//! 2. Score: `MatchScorer` over the survivors, in parallel
//! 3. Rank: score descending, ties by catalog id ascending
//! 4. Cap: at most `MAX_RECOMMENDATIONS`

use crate::context::{Budget, RequestContext, StylePreference};
use crate::error::Result;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::BudgetFilter;
use crate::scoring::{Affinity, MatchScorer};
use catalog::{Catalog, CatalogItem, ItemId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use vision::DetectedItem;

pub const MAX_RECOMMENDATIONS: usize = 6;

/// A catalog item ranked for the current request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// In [0, 1]
    pub match_score: f32,
}

impl Recommendation {
    pub fn id(&self) -> ItemId {
        self.item.id
    }
}

/// Produces ranked recommendations from the shared catalog
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    filters: FilterPipeline,
    scorer: MatchScorer,
    limit: usize,
}

impl RecommendationEngine {
    /// Engine with the default filter stage (budget only)
    pub fn new(catalog: Arc<Catalog>, affinity: Arc<dyn Affinity>) -> Self {
        Self {
            catalog,
            filters: FilterPipeline::new().add_filter(BudgetFilter),
            scorer: MatchScorer::new(affinity),
            limit: MAX_RECOMMENDATIONS,
        }
    }

    /// Replace the filter stage.
    ///
    /// The pipeline should include `BudgetFilter` or budgets are not
    /// enforced.
    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = filters;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rank catalog items for a request.
    ///
    /// # Arguments
    /// * `detected` - Clothing found in the photo (may be empty)
    /// * `style` - Requested clothing types; `None` disables the style bonus
    /// * `budget` - Inclusive price ceiling; negative or non-finite is `InvalidInput`
    pub fn generate_recommendations(
        &self,
        detected: &[DetectedItem],
        style: Option<&StylePreference>,
        budget: f64,
    ) -> Result<Vec<Recommendation>> {
        let mut context = RequestContext::new(Budget::new(budget)?).with_detected(detected.to_vec());
        if let Some(style) = style {
            context = context.with_style(style.clone());
        }

        self.recommend(&context)
    }

    /// Rank catalog items for an already-built request context
    pub fn recommend(&self, context: &RequestContext) -> Result<Vec<Recommendation>> {
        let candidates = self
            .filters
            .apply(self.catalog.items().iter().collect(), context)?;
        debug!(
            "{} of {} catalog items pass filters (budget {})",
            candidates.len(),
            self.catalog.len(),
            context.budget
        );

        let scores = self.scorer.score_all(&candidates, context);

        let mut ranked: Vec<Recommendation> = candidates
            .into_iter()
            .zip(scores)
            .map(|(item, match_score)| Recommendation {
                item: item.clone(),
                match_score,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| a.id().cmp(&b.id()))
        });
        ranked.truncate(self.limit);

        info!("Generated {} recommendations", ranked.len());
        Ok(ranked)
    }
}
