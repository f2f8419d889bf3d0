//! Remote model backend.
//!
//! The detection and pose models are served by an out-of-process vision
//! service over gRPC (see `proto/vision.proto`). This module provides:
//! - The protobuf messages, declared with `prost` derives
//! - `RemoteModelLoader`, which connects and asks the service to load a model
//! - `RemoteObjectDetector` / `RemotePoseEstimator`, the inference clients

use crate::error::{InferenceError, ModelError};
use crate::models::{ModelLoader, ObjectDetector, PoseEstimator};
use crate::types::{ImageHandle, Keypoint, RawPose, RawPrediction};
use std::sync::Arc;
use std::time::Duration;
use tonic::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, error, info};

/// Protobuf messages of the `vision.VisionService` API
pub mod proto {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoadModelRequest {
        #[prost(string, tag = "1")]
        pub model: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoadModelResponse {
        #[prost(bool, tag = "1")]
        pub ready: bool,
        #[prost(string, tag = "2")]
        pub message: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ImageRequest {
        #[prost(string, tag = "1")]
        pub model: String,
        #[prost(bytes = "vec", tag = "2")]
        pub image: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Prediction {
        #[prost(string, tag = "1")]
        pub class: String,
        #[prost(float, tag = "2")]
        pub score: f32,
        /// x, y, width, height
        #[prost(float, repeated, tag = "3")]
        pub bbox: Vec<f32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DetectResponse {
        #[prost(message, repeated, tag = "1")]
        pub predictions: Vec<Prediction>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Keypoint {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(float, tag = "2")]
        pub x: f32,
        #[prost(float, tag = "3")]
        pub y: f32,
        #[prost(float, tag = "4")]
        pub score: f32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Pose {
        #[prost(message, repeated, tag = "1")]
        pub keypoints: Vec<Keypoint>,
        #[prost(float, tag = "2")]
        pub score: f32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PoseResponse {
        #[prost(message, repeated, tag = "1")]
        pub poses: Vec<Pose>,
    }
}

const LOAD_MODEL: &str = "/vision.VisionService/LoadModel";
const DETECT_OBJECTS: &str = "/vision.VisionService/DetectObjects";
const ESTIMATE_POSES: &str = "/vision.VisionService/EstimatePoses";

/// Thin unary-call client over a shared channel
#[derive(Clone)]
struct VisionRpc {
    grpc: Grpc<Channel>,
}

impl VisionRpc {
    async fn connect(addr: &str, timeout: Duration) -> Result<Self, tonic::transport::Error> {
        let endpoint = Endpoint::from_shared(addr.to_string()).map_err(|e| {
            error!("Invalid vision service address {}: {}", addr, e);
            e
        })?;
        let channel = endpoint.connect_timeout(timeout).connect().await?;

        Ok(Self {
            grpc: Grpc::new(channel),
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        // Clones share the underlying connection
        let mut grpc = self.grpc.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("vision service not ready: {}", e)))?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(Request::new(request), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Loads a model hosted by the remote vision service.
///
/// Loading means connecting to the service and asking it to bring the
/// named model into memory. Implements `ModelLoader` for both model kinds.
#[derive(Debug, Clone)]
pub struct RemoteModelLoader {
    addr: String,
    model: String,
    connect_timeout: Duration,
}

impl RemoteModelLoader {
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50052")
    /// * `model` - Model name the service knows, e.g. "coco-ssd"
    pub fn new(addr: impl Into<String>, model: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            model: model.into(),
            connect_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn connect_and_load(&self) -> Result<VisionRpc, ModelError> {
        info!("Connecting to vision service at {} for model {}", self.addr, self.model);

        let rpc = VisionRpc::connect(&self.addr, self.connect_timeout)
            .await
            .map_err(|e| ModelError::load_failed(&self.model, format!("connect {}: {}", self.addr, e)))?;

        let response: proto::LoadModelResponse = rpc
            .unary(
                LOAD_MODEL,
                proto::LoadModelRequest {
                    model: self.model.clone(),
                },
            )
            .await
            .map_err(|status| ModelError::load_failed(&self.model, status.message()))?;

        if !response.ready {
            return Err(ModelError::load_failed(&self.model, response.message));
        }

        Ok(rpc)
    }
}

#[async_trait]
impl ModelLoader<dyn ObjectDetector> for RemoteModelLoader {
    async fn load(&self) -> Result<Arc<dyn ObjectDetector>, ModelError> {
        let rpc = self.connect_and_load().await?;
        Ok(Arc::new(RemoteObjectDetector {
            rpc,
            model: self.model.clone(),
        }))
    }
}

#[async_trait]
impl ModelLoader<dyn PoseEstimator> for RemoteModelLoader {
    async fn load(&self) -> Result<Arc<dyn PoseEstimator>, ModelError> {
        let rpc = self.connect_and_load().await?;
        Ok(Arc::new(RemotePoseEstimator {
            rpc,
            model: self.model.clone(),
        }))
    }
}

// =============================================================================
// Inference Clients
// =============================================================================

/// Object detector served by the vision service
pub struct RemoteObjectDetector {
    rpc: VisionRpc,
    model: String,
}

#[async_trait]
impl ObjectDetector for RemoteObjectDetector {
    async fn detect(&self, image: &ImageHandle) -> Result<Vec<RawPrediction>, InferenceError> {
        debug!("Detecting objects with {} ({} bytes)", self.model, image.len());

        let response: proto::DetectResponse = self
            .rpc
            .unary(
                DETECT_OBJECTS,
                proto::ImageRequest {
                    model: self.model.clone(),
                    image: image.as_bytes().to_vec(),
                },
            )
            .await?;

        response
            .predictions
            .into_iter()
            .map(prediction_from_proto)
            .collect()
    }
}

/// Pose estimator served by the vision service
pub struct RemotePoseEstimator {
    rpc: VisionRpc,
    model: String,
}

#[async_trait]
impl PoseEstimator for RemotePoseEstimator {
    async fn estimate(&self, image: &ImageHandle) -> Result<Vec<RawPose>, InferenceError> {
        debug!("Estimating poses with {} ({} bytes)", self.model, image.len());

        let response: proto::PoseResponse = self
            .rpc
            .unary(
                ESTIMATE_POSES,
                proto::ImageRequest {
                    model: self.model.clone(),
                    image: image.as_bytes().to_vec(),
                },
            )
            .await?;

        Ok(response.poses.into_iter().map(pose_from_proto).collect())
    }
}

fn prediction_from_proto(prediction: proto::Prediction) -> Result<RawPrediction, InferenceError> {
    let bbox: [f32; 4] = prediction.bbox.as_slice().try_into().map_err(|_| {
        InferenceError::MalformedOutput(format!(
            "prediction '{}' has {} bbox values, expected 4",
            prediction.class,
            prediction.bbox.len()
        ))
    })?;

    Ok(RawPrediction {
        label: prediction.class,
        score: prediction.score,
        bbox,
    })
}

fn pose_from_proto(pose: proto::Pose) -> RawPose {
    RawPose {
        keypoints: pose
            .keypoints
            .into_iter()
            .map(|kp| Keypoint::new(kp.name, kp.x, kp.y, kp.score))
            .collect(),
        score: pose.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_from_proto() {
        let prediction = proto::Prediction {
            class: "shoe".to_string(),
            score: 0.87,
            bbox: vec![10.0, 20.0, 30.0, 40.0],
        };

        let raw = prediction_from_proto(prediction).unwrap();
        assert_eq!(raw.label, "shoe");
        assert_eq!(raw.score, 0.87);
        assert_eq!(raw.bbox, [10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_prediction_with_short_bbox_is_malformed() {
        let prediction = proto::Prediction {
            class: "hat".to_string(),
            score: 0.5,
            bbox: vec![1.0, 2.0],
        };

        let err = prediction_from_proto(prediction).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedOutput(_)));
    }

    #[test]
    fn test_pose_from_proto() {
        let pose = proto::Pose {
            keypoints: vec![proto::Keypoint {
                name: "nose".to_string(),
                x: 0.5,
                y: 0.1,
                score: 0.9,
            }],
            score: 0.8,
        };

        let raw = pose_from_proto(pose);
        assert_eq!(raw.score, 0.8);
        assert_eq!(raw.keypoints, vec![Keypoint::new("nose", 0.5, 0.1, 0.9)]);
    }

    #[test]
    fn test_messages_encode() {
        use prost::Message;

        let request = proto::ImageRequest {
            model: "coco-ssd".to_string(),
            image: vec![1, 2, 3],
        };
        let bytes = request.encode_to_vec();
        let decoded = proto::ImageRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn test_load_fails_when_service_unreachable() {
        let loader = RemoteModelLoader::new("http://127.0.0.1:1", "coco-ssd", Duration::from_millis(200));

        let result: Result<Arc<dyn ObjectDetector>, ModelError> = loader.load().await;
        match result {
            Err(ModelError::LoadFailed { model, .. }) => assert_eq!(model, "coco-ssd"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load should fail without a service"),
        }
    }
}
