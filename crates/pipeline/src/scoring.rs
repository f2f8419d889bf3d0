//! Match scoring.
//!
//! matchScore = clamp(base affinity × compatibility + style bonus, 0, 1)
//!
//! - Base affinity: per-item desirability in [0.7, 1.0), from an `Affinity`
//! - Compatibility: × 0.9 when the photo showed any clothing
//! - Style bonus: + 0.1 when the user's style names the item's type
//!
//! ## Performance Note
//! Items are scored in parallel with Rayon; output order matches input order.

use crate::context::RequestContext;
use catalog::CatalogItem;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Multiplier applied when the photo already shows clothing
pub const COMPATIBILITY_FACTOR: f32 = 0.9;

/// Added when the item's type is one the user asked for
pub const STYLE_BONUS: f32 = 0.1;

/// Lowest and highest (exclusive) base affinity
pub const AFFINITY_RANGE: std::ops::Range<f32> = 0.7..1.0;

/// Catalog-intrinsic desirability of an item.
///
/// Implementations must be deterministic: the same item always gets the
/// same value.
pub trait Affinity: Send + Sync {
    fn base(&self, item: &CatalogItem) -> f32;
}

/// Same affinity for every item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAffinity(pub f32);

impl Affinity for FixedAffinity {
    fn base(&self, _item: &CatalogItem) -> f32 {
        self.0
    }
}

/// Pseudo-random affinity, reproducible per seed.
///
/// Each item draws from its own generator seeded with `seed ^ id`, so an
/// item's affinity does not depend on which other items are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededAffinity {
    pub seed: u64,
}

impl SeededAffinity {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Affinity for SeededAffinity {
    fn base(&self, item: &CatalogItem) -> f32 {
        let mut rng = StdRng::seed_from_u64(self.seed ^ u64::from(item.id));
        rng.random_range(AFFINITY_RANGE)
    }
}

/// Scores catalog items for one request
#[derive(Clone)]
pub struct MatchScorer {
    affinity: Arc<dyn Affinity>,
}

impl MatchScorer {
    pub fn new(affinity: Arc<dyn Affinity>) -> Self {
        Self { affinity }
    }

    /// Score one item
    pub fn score(&self, item: &CatalogItem, context: &RequestContext) -> f32 {
        let mut score = self.affinity.base(item);

        if !context.detected.is_empty() {
            score *= COMPATIBILITY_FACTOR;
        }
        if context.prefers(item.clothing_type) {
            score += STYLE_BONUS;
        }

        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    /// Score every item in parallel, in input order
    pub fn score_all(&self, items: &[&CatalogItem], context: &RequestContext) -> Vec<f32> {
        items
            .par_iter()
            .map(|item| self.score(item, context))
            .collect()
    }
}
