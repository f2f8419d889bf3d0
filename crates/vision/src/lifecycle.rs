//! # Model Lifecycle
//!
//! Lazily loads the heavyweight models and shares them across requests.
//!
//! Each model sits in a `ModelCell` that moves through three states:
//!
//! ```text
//! Unloaded --get()--> Loading --ok--> Ready
//!    ^                   |
//!    +------ error ------+
//! ```
//!
//! - The first `get()` spawns the load on its own tokio task. Every caller
//!   that arrives while it is in flight waits on the same load through a
//!   `watch` channel, so concurrent first calls trigger exactly one load
//!   and all observe the same model or the same error.
//! - A failed load returns the cell to `Unloaded`; the next `get()` retries.
//! - The load task is detached from the caller. Dropping a request future
//!   never cancels a load other requests are waiting on.
//! - A ready model is kept for the life of the process.

use crate::error::ModelError;
use crate::models::{ModelLoader, ObjectDetector, PoseEstimator};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Readiness of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelStatus::Unloaded => "unloaded",
            ModelStatus::Loading => "loading",
            ModelStatus::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// `None` until the in-flight load finishes
type LoadOutcome<M> = Option<Result<Arc<M>, ModelError>>;

enum Slot<M: ?Sized> {
    Unloaded,
    Loading(watch::Receiver<LoadOutcome<M>>),
    Ready(Arc<M>),
}

/// Single-flight, retryable holder for one lazily loaded model.
pub struct ModelCell<M: ?Sized> {
    name: String,
    loader: Arc<dyn ModelLoader<M>>,
    slot: Arc<Mutex<Slot<M>>>,
}

impl<M> ModelCell<M>
where
    M: ?Sized + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, loader: Arc<dyn ModelLoader<M>>) -> Self {
        Self {
            name: name.into(),
            loader,
            slot: Arc::new(Mutex::new(Slot::Unloaded)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current readiness
    pub fn status(&self) -> ModelStatus {
        match &*lock_slot(&self.slot) {
            Slot::Ready(_) => ModelStatus::Ready,
            Slot::Loading(rx) if load_in_flight(rx) => ModelStatus::Loading,
            _ => ModelStatus::Unloaded,
        }
    }

    /// Return the ready model, loading it first if needed.
    ///
    /// Waits for an in-flight load instead of starting a second one.
    pub async fn get(&self) -> Result<Arc<M>, ModelError> {
        let mut rx = {
            let mut slot = lock_slot(&self.slot);

            let in_flight = match &*slot {
                Slot::Ready(model) => return Ok(Arc::clone(model)),
                Slot::Loading(rx) if load_in_flight(rx) => Some(rx.clone()),
                // Unloaded, or a load task that died without reporting
                _ => None,
            };

            match in_flight {
                Some(rx) => {
                    debug!(model = %self.name, "Waiting for in-flight model load");
                    rx
                }
                None => {
                    let rx = self.spawn_load();
                    *slot = Slot::Loading(rx.clone());
                    rx
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };

        outcome.unwrap_or_else(|| {
            Err(ModelError::LoadAbandoned {
                model: self.name.clone(),
            })
        })
    }

    /// Start a load on a detached task; the caller holds the slot lock
    fn spawn_load(&self) -> watch::Receiver<LoadOutcome<M>> {
        let (tx, rx) = watch::channel(None);
        let loader = Arc::clone(&self.loader);
        let slot = Arc::clone(&self.slot);
        let name = self.name.clone();

        info!(model = %name, "Model loading");

        tokio::spawn(async move {
            let start = Instant::now();
            let result = loader.load().await;

            {
                let mut slot = lock_slot(&slot);
                match &result {
                    Ok(model) => {
                        *slot = Slot::Ready(Arc::clone(model));
                        info!(model = %name, elapsed = ?start.elapsed(), "Model ready");
                    }
                    Err(e) => {
                        *slot = Slot::Unloaded;
                        warn!(model = %name, error = %e, "Model load failed, will retry on next request");
                    }
                }
            }

            // Nobody left waiting is fine; the slot already has the outcome.
            let _ = tx.send(Some(result));
        });

        rx
    }
}

impl<M: ?Sized> fmt::Debug for ModelCell<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCell").field("name", &self.name).finish()
    }
}

fn lock_slot<M: ?Sized>(slot: &Mutex<Slot<M>>) -> MutexGuard<'_, Slot<M>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The sender is dropped once the load task finishes or dies
fn load_in_flight<T>(rx: &watch::Receiver<T>) -> bool {
    rx.has_changed().is_ok()
}

// =============================================================================
// Model Manager
// =============================================================================

/// Name and readiness of one managed model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub name: String,
    pub status: ModelStatus,
}

/// Owns the detection and pose models for the whole process.
///
/// Share it with `Arc<ModelManager>`; it is the only mutable state the
/// request pipeline touches.
#[derive(Debug)]
pub struct ModelManager {
    detection: ModelCell<dyn ObjectDetector>,
    pose: ModelCell<dyn PoseEstimator>,
}

impl ModelManager {
    pub fn new(
        detection: ModelCell<dyn ObjectDetector>,
        pose: ModelCell<dyn PoseEstimator>,
    ) -> Self {
        Self { detection, pose }
    }

    /// Ready object detector, loading it on first use
    pub async fn detection_model(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
        self.detection.get().await
    }

    /// Ready pose estimator, loading it on first use
    pub async fn pose_model(&self) -> Result<Arc<dyn PoseEstimator>, ModelError> {
        self.pose.get().await
    }

    pub fn statuses(&self) -> Vec<ModelReport> {
        vec![
            ModelReport {
                name: self.detection.name().to_string(),
                status: self.detection.status(),
            },
            ModelReport {
                name: self.pose.name().to_string(),
                status: self.pose.status(),
            },
        ]
    }

    /// Load both models concurrently.
    ///
    /// Failures are returned, not fatal: a model that fails here is retried
    /// by the first request that needs it.
    pub async fn warm_up(&self) -> Vec<(String, Result<(), ModelError>)> {
        let (detection, pose) = tokio::join!(self.detection.get(), self.pose.get());

        vec![
            (self.detection.name().to_string(), detection.map(|_| ())),
            (self.pose.name().to_string(), pose.map(|_| ())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::types::{ImageHandle, RawPose, RawPrediction};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tonic::async_trait;

    struct StubDetector;

    #[async_trait]
    impl ObjectDetector for StubDetector {
        async fn detect(&self, _image: &ImageHandle) -> Result<Vec<RawPrediction>, InferenceError> {
            Ok(vec![])
        }
    }

    struct StubPose;

    #[async_trait]
    impl PoseEstimator for StubPose {
        async fn estimate(&self, _image: &ImageHandle) -> Result<Vec<RawPose>, InferenceError> {
            Ok(vec![])
        }
    }

    /// Counts loads; each load waits for `release` and fails while `fail` is set
    struct GatedLoader {
        loads: AtomicUsize,
        fail: AtomicBool,
        release: Notify,
    }

    impl GatedLoader {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(fail),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl ModelLoader<dyn ObjectDetector> for GatedLoader {
        async fn load(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            if self.fail.load(Ordering::SeqCst) {
                Err(ModelError::load_failed("detector", "weights missing"))
            } else {
                Ok(Arc::new(StubDetector))
            }
        }
    }

    struct ImmediateLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ModelLoader<dyn ObjectDetector> for ImmediateLoader {
        async fn load(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubDetector))
        }
    }

    #[async_trait]
    impl ModelLoader<dyn PoseEstimator> for ImmediateLoader {
        async fn load(&self) -> Result<Arc<dyn PoseEstimator>, ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubPose))
        }
    }

    struct PanickingLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ModelLoader<dyn ObjectDetector> for PanickingLoader {
        async fn load(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("loader crashed");
            }
            Ok(Arc::new(StubDetector))
        }
    }

    /// Wait until the spawned load has started
    async fn wait_for_loads(loader: &GatedLoader, expected: usize) {
        while loader.loads.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_starts_unloaded() {
        let loader = GatedLoader::new(false);
        let cell: ModelCell<dyn ObjectDetector> = ModelCell::new("detector", loader.clone());

        assert_eq!(cell.status(), ModelStatus::Unloaded);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_share_one_load() {
        let loader = GatedLoader::new(false);
        let cell: Arc<ModelCell<dyn ObjectDetector>> =
            Arc::new(ModelCell::new("detector", loader.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cell = Arc::clone(&cell);
                tokio::spawn(async move { cell.get().await })
            })
            .collect();

        wait_for_loads(&loader, 1).await;
        assert_eq!(cell.status(), ModelStatus::Loading);
        loader.release.notify_one();

        let models: Vec<_> = futures_join(handles).await;
        let first = models[0].as_ref().unwrap();
        for model in &models {
            assert!(Arc::ptr_eq(model.as_ref().unwrap(), first));
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cell.status(), ModelStatus::Ready);
    }

    // Single-threaded so every caller is parked on the load before it fails
    #[tokio::test]
    async fn test_concurrent_callers_share_failure_then_retry() {
        let loader = GatedLoader::new(true);
        let cell: Arc<ModelCell<dyn ObjectDetector>> =
            Arc::new(ModelCell::new("detector", loader.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                tokio::spawn(async move { cell.get().await })
            })
            .collect();

        wait_for_loads(&loader, 1).await;
        loader.release.notify_one();

        let results = futures_join(handles).await;
        let expected = ModelError::load_failed("detector", "weights missing");
        for result in &results {
            assert_eq!(result.as_ref().err(), Some(&expected));
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cell.status(), ModelStatus::Unloaded);

        // Not poisoned: the next call loads again and can succeed
        loader.fail.store(false, Ordering::SeqCst);
        let retry = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move { cell.get().await })
        };
        wait_for_loads(&loader, 2).await;
        loader.release.notify_one();

        assert!(retry.await.unwrap().is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        assert_eq!(cell.status(), ModelStatus::Ready);
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_load() {
        let loader = GatedLoader::new(false);
        let cell: Arc<ModelCell<dyn ObjectDetector>> =
            Arc::new(ModelCell::new("detector", loader.clone()));

        let aborted = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move { cell.get().await })
        };
        wait_for_loads(&loader, 1).await;
        aborted.abort();
        let _ = aborted.await;

        loader.release.notify_one();
        assert!(cell.get().await.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicked_load_is_retryable() {
        let loader = Arc::new(PanickingLoader {
            loads: AtomicUsize::new(0),
        });
        let cell: ModelCell<dyn ObjectDetector> = ModelCell::new("detector", loader.clone());

        let first = cell.get().await;
        assert_eq!(
            first.err(),
            Some(ModelError::LoadAbandoned {
                model: "detector".to_string()
            })
        );
        assert_eq!(cell.status(), ModelStatus::Unloaded);

        assert!(cell.get().await.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_manager_warm_up_and_statuses() {
        let loader = Arc::new(ImmediateLoader {
            loads: AtomicUsize::new(0),
        });
        let manager = ModelManager::new(
            ModelCell::new("coco-ssd", loader.clone()),
            ModelCell::new("movenet", loader.clone()),
        );

        let statuses = manager.statuses();
        assert!(statuses.iter().all(|r| r.status == ModelStatus::Unloaded));

        let results = manager.warm_up().await;
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(results[0].0, "coco-ssd");
        assert_eq!(results[1].0, "movenet");

        let statuses = manager.statuses();
        assert!(statuses.iter().all(|r| r.status == ModelStatus::Ready));

        // Already ready: no further loads
        manager.detection_model().await.unwrap();
        manager.pose_model().await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    async fn futures_join<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.await.unwrap());
        }
        out
    }
}
