//! Classifier output types.

use serde::Serialize;

/// One labelled score from a single inference cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Always within `[0, 1]`.
    pub probability: f32,
}

impl Prediction {
    /// Build a prediction, clamping the score into `[0, 1]`. NaN becomes 0.
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Whether the label names the "wearing a mask" class.
    ///
    /// Case-insensitive substring match on `mask`, excluding the negated
    /// spellings `nomask` and `no mask`. A display heuristic only.
    pub fn shows_mask(&self) -> bool {
        let label = self.label.to_lowercase();
        label.contains("mask") && !label.contains("nomask") && !label.contains("no mask")
    }

    /// Score as a percentage with one decimal, e.g. `92.0%`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }
}

/// The `k` highest scoring predictions, best first. Ties keep model order.
pub fn top_k(predictions: &[Prediction], k: usize) -> Vec<Prediction> {
    let mut sorted = predictions.to_vec();
    sorted.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    sorted.truncate(k);
    sorted
}
