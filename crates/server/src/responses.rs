//! JSON-serializable results of the orchestrator operations.
//!
//! Every response carries `success` plus its operation-specific payload
//! (`data`, `suggestions` or `analysis`). Field names are camelCase.

use catalog::CatalogItem;
use chrono::{DateTime, Utc};
use pipeline::{BodyShapeResult, Budget, Recommendation, RecommendError};
use serde::{Deserialize, Serialize};
use vision::{DetectedItem, ModelReport};

/// Budget as sent by a client: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BudgetInput {
    Amount(f64),
    Text(String),
}

impl BudgetInput {
    /// Validate into a `Budget`; unparsable, negative or non-finite is `InvalidInput`
    pub fn to_budget(&self) -> Result<Budget, RecommendError> {
        match self {
            BudgetInput::Amount(amount) => Budget::new(*amount),
            BudgetInput::Text(text) => Budget::parse(text),
        }
    }
}

impl From<f64> for BudgetInput {
    fn from(amount: f64) -> Self {
        BudgetInput::Amount(amount)
    }
}

impl From<String> for BudgetInput {
    fn from(text: String) -> Self {
        BudgetInput::Text(text)
    }
}

impl From<&str> for BudgetInput {
    fn from(text: &str) -> Self {
        BudgetInput::Text(text.to_string())
    }
}

/// Parameters of a suggestion request, as a gateway receives them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// Clothing type names the user likes; `None` disables the style bonus
    #[serde(default, alias = "preferences")]
    pub style: Option<Vec<String>>,
    pub budget: BudgetInput,
}

impl SuggestionRequest {
    pub fn new(budget: impl Into<BudgetInput>) -> Self {
        Self {
            style: None,
            budget: budget.into(),
        }
    }

    pub fn with_style<I, S>(mut self, style: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style = Some(style.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub success: bool,
    pub data: Vec<DetectedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub success: bool,
    pub suggestions: Vec<Recommendation>,
    pub detected: Vec<DetectedItem>,
    pub body_shape: BodyShapeResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: BodyShapeResult,
    pub poses_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnResponse {
    pub success: bool,
    pub message: String,
    pub data: TryOnData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnData {
    /// Requested type, or "all"
    pub clothing_type: String,
    pub status: String,
    /// Catalog items of the requested type
    pub matching_items: Vec<CatalogItem>,
    pub poses_detected: usize,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub models: Vec<ModelReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_budget_is_accepted() {
        let request: SuggestionRequest = serde_json::from_str(r#"{"budget": 80}"#).unwrap();
        assert_eq!(request.budget.to_budget().unwrap().amount(), 80.0);
        assert_eq!(request.style, None);

        let request: SuggestionRequest = serde_json::from_str(r#"{"budget": 49.5}"#).unwrap();
        assert_eq!(request.budget.to_budget().unwrap().amount(), 49.5);
    }

    #[test]
    fn test_string_budget_is_accepted() {
        let request: SuggestionRequest = serde_json::from_str(r#"{"budget": " 80 "}"#).unwrap();
        assert_eq!(request.budget, BudgetInput::Text(" 80 ".to_string()));
        assert_eq!(request.budget.to_budget().unwrap().amount(), 80.0);
    }

    #[test]
    fn test_bad_budget_values_are_invalid_input() {
        for body in [r#"{"budget": -5}"#, r#"{"budget": "-5"}"#, r#"{"budget": "lots"}"#] {
            let request: SuggestionRequest = serde_json::from_str(body).unwrap();
            assert!(
                matches!(request.budget.to_budget(), Err(RecommendError::InvalidInput(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_preferences_is_read_as_style() {
        let request: SuggestionRequest =
            serde_json::from_str(r#"{"budget": "80", "preferences": ["shirt"]}"#).unwrap();
        assert_eq!(request.style, Some(vec!["shirt".to_string()]));

        let request: SuggestionRequest =
            serde_json::from_str(r#"{"budget": 80, "style": ["pants", "dress"]}"#).unwrap();
        assert_eq!(
            request.style,
            Some(vec!["pants".to_string(), "dress".to_string()])
        );
    }

    #[test]
    fn test_builder_matches_deserialized() {
        let built = SuggestionRequest::new(80.0).with_style(["shirt"]);
        let parsed: SuggestionRequest =
            serde_json::from_str(r#"{"budget": 80, "preferences": ["shirt"]}"#).unwrap();
        assert_eq!(built, parsed);
    }
}
