//! Per-request inputs to the recommendation engine.
//!
//! `Budget` and `StylePreference` are validated at construction, so
//! everything downstream can trust them.

use crate::error::{RecommendError, Result};
use catalog::ClothingType;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;
use vision::DetectedItem;

/// Inclusive price ceiling: finite and non-negative
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Budget(f64);

impl Budget {
    pub fn new(amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(RecommendError::InvalidInput(format!(
                "budget must be a finite number, got {}",
                amount
            )));
        }
        if amount < 0.0 {
            return Err(RecommendError::InvalidInput(format!(
                "budget must not be negative, got {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// Parse a budget from a form field or command-line value
    pub fn parse(s: &str) -> Result<Self> {
        let amount = s.trim().parse::<f64>().map_err(|_| {
            RecommendError::InvalidInput(format!("budget is not a number: '{}'", s))
        })?;
        Self::new(amount)
    }

    pub fn amount(&self) -> f64 {
        self.0
    }

    /// Whether an item at this price fits (price == budget fits)
    pub fn allows(&self, price: f64) -> bool {
        price <= self.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// Clothing types the user asked for.
///
/// Built from free-text names; names that are not a clothing type are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePreference {
    types: BTreeSet<ClothingType>,
}

impl StylePreference {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types = names
            .into_iter()
            .filter_map(|name| match name.as_ref().parse::<ClothingType>() {
                Ok(ClothingType::Unknown) | Err(_) => {
                    debug!("Ignoring unknown style preference '{}'", name.as_ref());
                    None
                }
                Ok(t) => Some(t),
            })
            .collect();

        Self { types }
    }

    pub fn contains(&self, clothing_type: ClothingType) -> bool {
        self.types.contains(&clothing_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = ClothingType> + '_ {
        self.types.iter().copied()
    }
}

impl FromIterator<ClothingType> for StylePreference {
    fn from_iter<T: IntoIterator<Item = ClothingType>>(iter: T) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

/// Everything a filter or scorer may consult for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub budget: Budget,
    pub style: Option<StylePreference>,
    pub detected: Vec<DetectedItem>,
}

impl RequestContext {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            style: None,
            detected: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: StylePreference) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_detected(mut self, detected: Vec<DetectedItem>) -> Self {
        self.detected = detected;
        self
    }

    /// Whether the user's style names this type
    pub fn prefers(&self, clothing_type: ClothingType) -> bool {
        self.style
            .as_ref()
            .is_some_and(|style| style.contains(clothing_type))
    }
}
