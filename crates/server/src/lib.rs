//! Server crate for the outfit recommendation pipeline.
//!
//! This crate contains the orchestrator that composes detection, pose,
//! body shape and recommendation per request, plus its configuration and
//! the response objects a gateway serializes.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod responses;

pub use config::Config;
pub use error::{ErrorClass, OrchestratorError};
pub use orchestrator::PipelineOrchestrator;
pub use responses::{
    AnalysisResponse, BudgetInput, DetectionResponse, HealthReport, SuggestionRequest,
    SuggestionResponse, TryOnData, TryOnResponse,
};
