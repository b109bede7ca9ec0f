//! ONNX backend built on tract.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use tract_onnx::prelude::*;

use super::metadata::ModelMetadata;
use super::{Classifier, ModelError, ModelLoader, ModelPaths, Prediction, TensorLayout};
use crate::camera::{fit_to, Frame, Resolution};

type Plan = TypedRunnableModel<TypedModel>;

/// Loads ONNX image models and their label metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxLoader {
    pub layout: TensorLayout,
}

impl OnnxLoader {
    pub fn new(layout: TensorLayout) -> Self {
        Self { layout }
    }
}

impl ModelLoader for OnnxLoader {
    fn load(
        &self,
        paths: &ModelPaths,
    ) -> BoxFuture<'static, Result<Arc<dyn Classifier>, ModelError>> {
        let paths = paths.clone();
        let layout = self.layout;
        Box::pin(async move {
            let classifier =
                tokio::task::spawn_blocking(move || OnnxClassifier::load(&paths, layout))
                    .await
                    .map_err(|e| ModelError::Inference(format!("model loader task: {}", e)))??;
            Ok(Arc::new(classifier) as Arc<dyn Classifier>)
        })
    }
}

/// A runnable ONNX classifier.
pub struct OnnxClassifier {
    plan: Arc<Plan>,
    labels: Arc<Vec<String>>,
    image_size: u32,
    layout: TensorLayout,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("labels", &self.labels)
            .field("image_size", &self.image_size)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load and optimise the model. Blocking; call off the async runtime.
    pub fn load(paths: &ModelPaths, layout: TensorLayout) -> Result<Self, ModelError> {
        let metadata = ModelMetadata::load(&paths.metadata)?;
        std::fs::metadata(&paths.model).map_err(|e| ModelError::Read {
            path: paths.model.clone(),
            source: e,
        })?;

        let size = metadata.image_size as usize;
        let shape = match layout {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        };
        log::info!(
            "Loading model {} ({} labels, input {:?})",
            paths.model.display(),
            metadata.labels.len(),
            shape
        );

        let load_err = |e: TractError| ModelError::Load {
            path: paths.model.clone(),
            message: format!("{:#}", e),
        };
        let plan = tract_onnx::onnx()
            .model_for_path(&paths.model)
            .and_then(|m| m.with_input_fact(0, f32::fact(shape).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(load_err)?;

        let outputs = plan
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|s| s.iter().product::<usize>()));
        if let Some(outputs) = outputs {
            if outputs != metadata.labels.len() {
                return Err(ModelError::LabelMismatch {
                    outputs,
                    labels: metadata.labels.len(),
                });
            }
        }

        Ok(Self {
            plan: Arc::new(plan),
            labels: Arc::new(metadata.labels),
            image_size: metadata.image_size,
            layout,
        })
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, frame: Arc<Frame>) -> BoxFuture<'static, Result<Vec<Prediction>, ModelError>> {
        let plan = Arc::clone(&self.plan);
        let labels = Arc::clone(&self.labels);
        let size = self.image_size;
        let layout = self.layout;

        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let input = preprocess(&frame, size, layout)?;
                let outputs = plan
                    .run(tvec!(input.into()))
                    .map_err(|e| ModelError::Inference(format!("{:#}", e)))?;
                let first = outputs
                    .first()
                    .ok_or_else(|| ModelError::Inference("model produced no outputs".into()))?;
                let scores: Vec<f32> = first
                    .to_array_view::<f32>()
                    .map_err(|e| ModelError::Inference(format!("{:#}", e)))?
                    .iter()
                    .copied()
                    .collect();
                pair_scores(&labels, &scores)
            })
            .await
            .map_err(|e| ModelError::Inference(format!("inference task: {}", e)))?
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Turn a frame into the model's input tensor.
///
/// The frame is centre-cropped to a square, resized to `size`, and each
/// channel is scaled from `0..=255` to `-1..=1`.
pub fn preprocess(frame: &Frame, size: u32, layout: TensorLayout) -> Result<Tensor, ModelError> {
    let bad_frame = || ModelError::BadFrame {
        width: frame.width,
        height: frame.height,
    };
    let expected = frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(bad_frame());
    }
    let fitted = fit_to(frame.clone(), Resolution::new(size, size)).ok_or_else(bad_frame)?;

    let s = size as usize;
    let data = &fitted.data;
    let px = |y: usize, x: usize, c: usize| data[(y * s + x) * 3 + c] as f32 / 127.5 - 1.0;

    let array = match layout {
        TensorLayout::Nhwc => {
            tract_ndarray::Array4::from_shape_fn((1, s, s, 3), |(_, y, x, c)| px(y, x, c))
        }
        TensorLayout::Nchw => {
            tract_ndarray::Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| px(y, x, c))
        }
    };
    Ok(array.into())
}

/// Pair raw scores with labels, in label order.
fn pair_scores(labels: &[String], scores: &[f32]) -> Result<Vec<Prediction>, ModelError> {
    if scores.len() != labels.len() {
        return Err(ModelError::LabelMismatch {
            outputs: scores.len(),
            labels: labels.len(),
        });
    }
    Ok(labels
        .iter()
        .zip(scores)
        .map(|(label, &score)| Prediction::new(label.clone(), score))
        .collect())
}
