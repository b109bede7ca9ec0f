//! The image classifier: loading, the predict contract, and the ONNX backend.

mod metadata;
mod onnx;
mod prediction;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::camera::Frame;

pub use metadata::{ModelMetadata, DEFAULT_IMAGE_SIZE};
pub use onnx::{preprocess, OnnxClassifier, OnnxLoader};
pub use prediction::{top_k, Prediction};

/// A loaded classification model.
///
/// `predict` is asynchronous so that backends can move the heavy lifting
/// off the detector task. Results come back in the model's label order.
pub trait Classifier: Send + Sync {
    fn predict(&self, frame: Arc<Frame>) -> BoxFuture<'static, Result<Vec<Prediction>, ModelError>>;

    /// Class labels in output order.
    fn labels(&self) -> &[String];
}

/// Loads a [`Classifier`] from a model file and its label metadata.
pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
        paths: &ModelPaths,
    ) -> BoxFuture<'static, Result<Arc<dyn Classifier>, ModelError>>;
}

/// Locations of the two model artefacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub metadata: PathBuf,
}

impl ModelPaths {
    /// Resolve both artefacts relative to a base directory.
    pub fn in_dir(dir: &Path, model_file: &str, metadata_file: &str) -> Self {
        Self {
            model: dir.join(model_file),
            metadata: dir.join(metadata_file),
        }
    }
}

/// Memory layout of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, what image-model exports from TF produce.
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, PyTorch style.
    Nchw,
}

/// Errors from loading or running the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model metadata: {0}")]
    InvalidMetadata(String),
    #[error("Failed to load model '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },
    #[error("Model produced {outputs} scores for {labels} labels")]
    LabelMismatch { outputs: usize, labels: usize },
    #[error("Frame is not a valid {width}x{height} RGB image")]
    BadFrame { width: u32, height: u32 },
    #[error("Inference failed: {0}")]
    Inference(String),
}
