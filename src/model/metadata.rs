//! Label metadata that ships next to the model file.

use serde::Deserialize;
use std::path::Path;

use super::ModelError;

/// Input size used when the metadata does not say.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Label metadata in the image-model export format.
///
/// Only `labels` is required. Everything else the exporter writes
/// (versions, timestamps, user metadata) is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub labels: Vec<String>,
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    #[serde(default)]
    pub model_name: Option<String>,
}

fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

impl ModelMetadata {
    /// Parse metadata from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let metadata: ModelMetadata =
            serde_json::from_str(text).map_err(|e| ModelError::InvalidMetadata(e.to_string()))?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Read and parse a metadata file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::InvalidMetadata("label list is empty".into()));
        }
        if self.image_size == 0 {
            return Err(ModelError::InvalidMetadata("imageSize must be > 0".into()));
        }
        Ok(())
    }
}
