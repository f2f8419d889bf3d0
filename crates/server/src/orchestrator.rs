//! # Pipeline Orchestrator
//!
//! This module coordinates the outfit pipeline for each request:
//! 1. Validate caller parameters (budget, style)
//! 2. Run clothing detection and pose estimation concurrently
//! 3. Classify body shape from the best pose
//! 4. Rank catalog items for the detections, style and budget
//! 5. Assemble the response object
//!
//! Requests are independent; the only shared state is the `ModelManager`
//! and the immutable catalog. Detection and pose failures degrade to empty
//! results. Only invalid input, and in strict mode an unloadable model,
//! fail a request.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use catalog::{Catalog, ClothingType};
use pipeline::filters::{BudgetFilter, ExcludeTypesFilter};
use pipeline::{
    classify_body_shape, BodyShapeResult, FilterPipeline, RecommendationEngine, RequestContext,
    SeededAffinity, StylePreference,
};
use vision::{
    DetectedItem, DetectionPipeline, ImageHandle, ModelCell, ModelLoader, ModelManager,
    ObjectDetector, PoseEstimator, PosePipeline, PoseResult, RemoteModelLoader,
};

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::responses::{
    AnalysisResponse, DetectionResponse, HealthReport, SuggestionRequest, SuggestionResponse,
    TryOnData, TryOnResponse,
};

/// Requested try-on type meaning "every type"
pub const ALL_TYPES: &str = "all";

/// Composes detection, pose, body shape and recommendation per request
#[derive(Clone)]
pub struct PipelineOrchestrator {
    models: Arc<ModelManager>,
    detection: DetectionPipeline,
    pose: PosePipeline,
    engine: Arc<RecommendationEngine>,
    strict_models: bool,
}

impl PipelineOrchestrator {
    /// Create an orchestrator over shared models and a recommendation engine
    pub fn new(models: Arc<ModelManager>, engine: RecommendationEngine) -> Self {
        Self {
            detection: DetectionPipeline::new(Arc::clone(&models)),
            pose: PosePipeline::new(Arc::clone(&models)),
            models,
            engine: Arc::new(engine),
            strict_models: false,
        }
    }

    /// Fail requests with `ModelUnavailable` when a model cannot be loaded
    pub fn with_strict_models(mut self, strict: bool) -> Self {
        self.strict_models = strict;
        self
    }

    /// Build the production orchestrator: remote models plus the configured catalog
    ///
    /// Models are not contacted here; they load on first use or in `warm_up`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load_from_path(path)
                .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
            None => Catalog::builtin(),
        };
        info!("Catalog ready with {} items", catalog.len());

        let detector: Arc<dyn ModelLoader<dyn ObjectDetector>> = Arc::new(RemoteModelLoader::new(
            &config.vision_addr,
            &config.detection_model,
            config.connect_timeout(),
        ));
        let estimator: Arc<dyn ModelLoader<dyn PoseEstimator>> = Arc::new(RemoteModelLoader::new(
            &config.vision_addr,
            &config.pose_model,
            config.connect_timeout(),
        ));

        let models = Arc::new(ModelManager::new(
            ModelCell::new(config.detection_model.clone(), detector),
            ModelCell::new(config.pose_model.clone(), estimator),
        ));
        let mut engine = RecommendationEngine::new(
            Arc::new(catalog),
            Arc::new(SeededAffinity::new(config.affinity_seed)),
        );
        if !config.exclude_types.is_empty() {
            info!("Excluding clothing types {:?}", config.exclude_types);
            engine = engine.with_filters(
                FilterPipeline::new()
                    .add_filter(BudgetFilter)
                    .add_filter(ExcludeTypesFilter::new(config.exclude_types.iter().copied())),
            );
        }

        Ok(Self::new(models, engine).with_strict_models(config.strict_models))
    }

    /// Load both models now. Failures are logged; requests retry them.
    pub async fn warm_up(&self) {
        for (model, result) in self.models.warm_up().await {
            match result {
                Ok(()) => info!("Model {} ready", model),
                Err(e) => warn!("Model {} not ready after warm-up: {}", model, e),
            }
        }
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "Virtual Try-On AI System is running".to_string(),
            models: self.models.statuses(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Detect clothing in an image
    pub async fn detect_clothing(
        &self,
        image: &ImageHandle,
    ) -> Result<DetectionResponse, OrchestratorError> {
        let data = self.detect(image).await?;
        info!("Detected {} clothing items", data.len());

        Ok(DetectionResponse {
            success: true,
            data,
        })
    }

    /// Detect, classify and recommend for an image plus user preferences
    pub async fn generate_suggestions(
        &self,
        image: &ImageHandle,
        request: SuggestionRequest,
    ) -> Result<SuggestionResponse, OrchestratorError> {
        let start_time = Instant::now();

        // Reject bad parameters before any model work
        let budget = request.budget.to_budget()?;
        let style = request.style.as_ref().map(StylePreference::from_names);

        let (detected, poses) = self.detect_and_estimate(image).await?;
        debug!("Detection and pose done in {:?}", start_time.elapsed());

        let body_shape = classify_best_pose(&poses);

        let mut context = RequestContext::new(budget).with_detected(detected.clone());
        if let Some(style) = style {
            context = context.with_style(style);
        }

        // Scoring is CPU-bound (Rayon); keep it off the async workers
        let engine = Arc::clone(&self.engine);
        let suggestions = tokio::task::spawn_blocking(move || engine.recommend(&context))
            .await
            .map_err(|e| OrchestratorError::Internal(format!("scoring task failed: {}", e)))??;

        info!(
            "Generated {} suggestions ({} detected items, shape {}) in {:?}",
            suggestions.len(),
            detected.len(),
            body_shape.shape,
            start_time.elapsed()
        );

        Ok(SuggestionResponse {
            success: true,
            suggestions,
            detected,
            body_shape,
        })
    }

    /// Classify body shape from the most confident pose in an image
    pub async fn analyze_body_shape(
        &self,
        image: &ImageHandle,
    ) -> Result<AnalysisResponse, OrchestratorError> {
        let poses = self.estimate(image).await?;
        let analysis = classify_best_pose(&poses);
        info!(
            "Body shape {} (confidence {:.2}) from {} poses",
            analysis.shape,
            analysis.confidence,
            poses.len()
        );

        Ok(AnalysisResponse {
            success: true,
            analysis,
            poses_detected: poses.len(),
        })
    }

    /// Prepare a virtual try-on of one clothing type (or "all")
    ///
    /// # Arguments
    /// * `clothing_type` - Type name; `None` or empty means "all"
    pub async fn process_try_on(
        &self,
        image: &ImageHandle,
        clothing_type: Option<&str>,
    ) -> Result<TryOnResponse, OrchestratorError> {
        let requested = clothing_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(ALL_TYPES)
            .to_ascii_lowercase();

        let catalog = self.engine.catalog();
        let matching_items = if requested == ALL_TYPES {
            catalog.items().to_vec()
        } else {
            let parsed = requested.parse::<ClothingType>().map_err(|_| {
                OrchestratorError::InvalidInput(format!("unknown clothing type '{}'", requested))
            })?;
            catalog
                .items_by_type(parsed)
                .iter()
                .filter_map(|id| catalog.get_item(*id).cloned())
                .collect()
        };

        let poses = self.estimate(image).await?;

        Ok(TryOnResponse {
            success: true,
            message: "Virtual try-on processed successfully".to_string(),
            data: TryOnData {
                clothing_type: requested,
                status: "processed".to_string(),
                matching_items,
                poses_detected: poses.len(),
                processed_at: Utc::now(),
            },
        })
    }

    // =========================================================================
    // Stages
    // =========================================================================

    async fn detect(&self, image: &ImageHandle) -> Result<Vec<DetectedItem>, OrchestratorError> {
        if self.strict_models {
            Ok(self.detection.try_detect_clothing(image).await?)
        } else {
            Ok(self.detection.detect_clothing(image).await)
        }
    }

    async fn estimate(&self, image: &ImageHandle) -> Result<Vec<PoseResult>, OrchestratorError> {
        if self.strict_models {
            Ok(self.pose.try_analyze_pose(image).await?)
        } else {
            Ok(self.pose.analyze_pose(image).await)
        }
    }

    /// Run detection and pose estimation concurrently
    async fn detect_and_estimate(
        &self,
        image: &ImageHandle,
    ) -> Result<(Vec<DetectedItem>, Vec<PoseResult>), OrchestratorError> {
        let (detected, poses) = tokio::join!(self.detect(image), self.estimate(image));
        Ok((detected?, poses?))
    }
}

/// Classify the highest-scoring pose; no poses means unknown
fn classify_best_pose(poses: &[PoseResult]) -> BodyShapeResult {
    poses
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|pose| classify_body_shape(&pose.keypoints))
        .unwrap_or_else(BodyShapeResult::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use pipeline::{BodyShape, Budget, FixedAffinity};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tonic::async_trait;
    use vision::{InferenceError, Keypoint, ModelError, ModelStatus, RawPose, RawPrediction};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    struct MockDetector;

    #[async_trait]
    impl ObjectDetector for MockDetector {
        async fn detect(&self, _image: &ImageHandle) -> Result<Vec<RawPrediction>, InferenceError> {
            Ok(vec![
                RawPrediction {
                    label: "shirt".to_string(),
                    score: 0.92,
                    bbox: [10.0, 10.0, 80.0, 60.0],
                },
                RawPrediction {
                    label: "person".to_string(),
                    score: 0.99,
                    bbox: [0.0, 0.0, 100.0, 200.0],
                },
                RawPrediction {
                    label: "pants".to_string(),
                    score: 0.88,
                    bbox: [15.0, 80.0, 70.0, 100.0],
                },
            ])
        }
    }

    struct MockPose;

    #[async_trait]
    impl PoseEstimator for MockPose {
        async fn estimate(&self, _image: &ImageHandle) -> Result<Vec<RawPose>, InferenceError> {
            Ok(vec![
                // Background person, low score, pear proportions
                RawPose {
                    keypoints: shoulders_and_hips(10.0, 20.0),
                    score: 0.4,
                },
                // Main subject, fit proportions
                RawPose {
                    keypoints: shoulders_and_hips(30.0, 20.0),
                    score: 0.9,
                },
            ])
        }
    }

    fn shoulders_and_hips(shoulder: f32, hip: f32) -> Vec<Keypoint> {
        vec![
            Keypoint::new("left_shoulder", 100.0 - shoulder, 50.0, 0.9),
            Keypoint::new("right_shoulder", 100.0 + shoulder, 50.0, 0.9),
            Keypoint::new("left_hip", 100.0 - hip, 150.0, 0.9),
            Keypoint::new("right_hip", 100.0 + hip, 150.0, 0.9),
        ]
    }

    /// Loader serving the mocks, or failing every load
    struct MockLoader {
        fail: bool,
        loads: AtomicUsize,
    }

    impl MockLoader {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                loads: AtomicUsize::new(0),
            })
        }

        fn check(&self) -> Result<(), ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ModelError::load_failed("mock", "service unreachable"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ModelLoader<dyn ObjectDetector> for MockLoader {
        async fn load(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
            self.check()?;
            Ok(Arc::new(MockDetector))
        }
    }

    #[async_trait]
    impl ModelLoader<dyn PoseEstimator> for MockLoader {
        async fn load(&self) -> Result<Arc<dyn PoseEstimator>, ModelError> {
            self.check()?;
            Ok(Arc::new(MockPose))
        }
    }

    fn build_test_orchestrator(loader: Arc<MockLoader>) -> PipelineOrchestrator {
        let models = Arc::new(ModelManager::new(
            ModelCell::new("coco-ssd", loader.clone()),
            ModelCell::new("movenet-lightning", loader),
        ));
        let engine = RecommendationEngine::new(
            Arc::new(Catalog::builtin()),
            Arc::new(FixedAffinity(0.8)),
        );
        PipelineOrchestrator::new(models, engine)
    }

    fn image() -> ImageHandle {
        ImageHandle::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    // ============================================================================
    // Operations
    // ============================================================================

    #[tokio::test]
    async fn test_detect_clothing_filters_non_clothing() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));

        let response = orchestrator.detect_clothing(&image()).await.unwrap();

        assert!(response.success);
        let types: Vec<_> = response.data.iter().map(|d| d.clothing_type).collect();
        assert_eq!(types, vec![ClothingType::Shirt, ClothingType::Pants]);
    }

    #[tokio::test]
    async fn test_generate_suggestions_end_to_end() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));
        let request = SuggestionRequest::new("80").with_style(["shirt"]);

        let response = orchestrator
            .generate_suggestions(&image(), request)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.detected.len(), 2);
        assert_eq!(response.body_shape.shape, BodyShape::Fit);

        // shirt $50, pants $80, dress $60; shirt gets the style bonus
        let ids: Vec<_> = response.suggestions.iter().map(|s| s.item.id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
        // 0.8 × 0.9 (clothing detected) + 0.1
        assert!((response.suggestions[0].match_score - 0.82).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_invalid_budget_is_client_error() {
        let loader = MockLoader::new(false);
        let orchestrator = build_test_orchestrator(loader.clone());

        for budget in ["-5", "lots", ""] {
            let err = orchestrator
                .generate_suggestions(&image(), SuggestionRequest::new(budget))
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidInput(_)));
            assert_eq!(err.class(), ErrorClass::Client);
        }

        // Rejected before any model was touched
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_degrades_by_default() {
        let orchestrator = build_test_orchestrator(MockLoader::new(true));

        let response = orchestrator
            .generate_suggestions(&image(), SuggestionRequest::new("1000"))
            .await
            .unwrap();

        assert!(response.detected.is_empty());
        assert_eq!(response.body_shape, BodyShapeResult::unknown());
        assert_eq!(response.suggestions.len(), 5);
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error_in_strict_mode() {
        let orchestrator = build_test_orchestrator(MockLoader::new(true)).with_strict_models(true);

        let err = orchestrator.detect_clothing(&image()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ModelUnavailable(_)));
        assert_eq!(err.class(), ErrorClass::Server);

        let err = orchestrator.analyze_body_shape(&image()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_analyze_body_shape_uses_best_pose() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));

        let response = orchestrator.analyze_body_shape(&image()).await.unwrap();

        assert!(response.success);
        assert_eq!(response.poses_detected, 2);
        assert_eq!(response.analysis.shape, BodyShape::Fit);
        assert_eq!(response.analysis.recommendations[0], "Any style works");
    }

    #[tokio::test]
    async fn test_process_try_on() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));

        let all = orchestrator.process_try_on(&image(), None).await.unwrap();
        assert_eq!(all.data.clothing_type, "all");
        assert_eq!(all.data.matching_items.len(), 5);
        assert_eq!(all.data.poses_detected, 2);

        let shoes = orchestrator
            .process_try_on(&image(), Some("Shoes"))
            .await
            .unwrap();
        assert_eq!(shoes.data.clothing_type, "shoes");
        assert_eq!(shoes.data.matching_items.len(), 1);
        assert_eq!(shoes.data.matching_items[0].id, 3);

        let err = orchestrator
            .process_try_on(&image(), Some("cape"))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Client);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let loader = MockLoader::new(false);
        let orchestrator = build_test_orchestrator(loader.clone());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .generate_suggestions(&image(), SuggestionRequest::new("100"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        // One load per model
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warm_up_and_health() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));

        let before = orchestrator.health();
        assert!(before.models.iter().all(|m| m.status == ModelStatus::Unloaded));

        orchestrator.warm_up().await;

        let after = orchestrator.health();
        assert_eq!(after.models.len(), 2);
        assert!(after.models.iter().all(|m| m.status == ModelStatus::Ready));
    }

    #[tokio::test]
    async fn test_response_json_shape() {
        let orchestrator = build_test_orchestrator(MockLoader::new(false));

        let response = orchestrator
            .generate_suggestions(&image(), SuggestionRequest::new("60"))
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["bodyShape"]["shape"], "fit");
        assert!(json["suggestions"][0]["matchScore"].is_number());
        assert_eq!(json["detected"][0]["boundingBox"]["width"], 80.0);
    }

    #[test]
    fn test_from_config_with_missing_catalog_fails() {
        let config = Config {
            catalog_path: Some("/nonexistent/catalog.dat".into()),
            ..Config::default()
        };

        assert!(PipelineOrchestrator::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_does_not_connect() {
        let orchestrator = PipelineOrchestrator::from_config(&Config::default()).unwrap();

        let health = orchestrator.health();
        assert_eq!(health.models[0].name, "coco-ssd");
        assert_eq!(health.models[1].name, "movenet-lightning");
    }

    #[test]
    fn test_from_config_applies_excluded_types() {
        let config = Config {
            exclude_types: vec![ClothingType::Shirt, ClothingType::Pants],
            ..Config::default()
        };
        let orchestrator = PipelineOrchestrator::from_config(&config).unwrap();

        let context = RequestContext::new(Budget::new(1000.0).unwrap());
        let recs = orchestrator.engine.recommend(&context).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| {
            r.item.clothing_type != ClothingType::Shirt && r.item.clothing_type != ClothingType::Pants
        }));

        // Budget is still enforced alongside the exclusion
        let context = RequestContext::new(Budget::new(0.0).unwrap());
        assert!(orchestrator.engine.recommend(&context).unwrap().is_empty());
    }
}
