//! Configuration file handling for mask-detector.
//!
//! Loads configuration from `<config dir>/mask-detector/config.toml` or a
//! custom path. Every field has a default, so a missing file or a partial
//! one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::{CameraSettings, Resolution};
use crate::model::{ModelPaths, TensorLayout};
use crate::ui::{Locale, ViewOptions};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding both model artefacts.
    pub dir: PathBuf,
    pub file: String,
    pub metadata: String,
    pub layout: TensorLayout,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("model"),
            file: "model.onnx".to_string(),
            metadata: "metadata.json".to_string(),
            layout: TensorLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let settings = CameraSettings::default();
        Self {
            device: settings.device_index,
            width: settings.resolution.width,
            height: settings.resolution.height,
            fps: settings.fps,
            mirror: settings.mirror,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Inference ticks per second.
    pub refresh_rate: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { refresh_rate: 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub locale: Locale,
    pub highlight_threshold: f32,
    pub preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_predictions: Option<usize>,
}

impl Default for UiConfig {
    fn default() -> Self {
        let view = ViewOptions::default();
        Self {
            locale: view.locale,
            highlight_threshold: view.highlight_threshold,
            preview: view.preview,
            max_predictions: view.max_predictions,
        }
    }
}

/// Values given on the command line. `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_dir: Option<PathBuf>,
    pub camera: Option<u32>,
    pub locale: Option<Locale>,
    pub layout: Option<TensorLayout>,
    pub no_preview: bool,
}

impl Config {
    /// Load configuration from a file path, or the default location.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            log::debug!("No config at {}; using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera size {}x{} must be non-zero",
                self.camera.width, self.camera.height
            )));
        }
        if !(0.0..=1.0).contains(&self.ui.highlight_threshold) {
            return Err(ConfigError::Invalid(format!(
                "ui.highlight_threshold {} must be within 0..=1",
                self.ui.highlight_threshold
            )));
        }
        if self.detector.refresh_rate == 0 {
            return Err(ConfigError::Invalid(
                "detector.refresh_rate must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.model_dir {
            self.model.dir = dir.clone();
        }
        if let Some(device) = overrides.camera {
            self.camera.device = device;
        }
        if let Some(locale) = overrides.locale {
            self.ui.locale = locale;
        }
        if let Some(layout) = overrides.layout {
            self.model.layout = layout;
        }
        if overrides.no_preview {
            self.ui.preview = false;
        }
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::in_dir(&self.model.dir, &self.model.file, &self.model.metadata)
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: self.camera.device,
            resolution: Resolution::new(self.camera.width, self.camera.height),
            fps: self.camera.fps,
            mirror: self.camera.mirror,
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            locale: self.ui.locale,
            highlight_threshold: self.ui.highlight_threshold,
            preview: self.ui.preview,
            max_predictions: self.ui.max_predictions,
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("mask-detector").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/mask-detector/config.toml")
        })
}

/// Commented template written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# mask-detector configuration

[model]
# Directory containing the model and its label metadata
dir = "model"
file = "model.onnx"
metadata = "metadata.json"
# Image input layout: nhwc (TF exports) or nchw (PyTorch exports)
layout = "nhwc"

[camera]
# Camera device index (see `mask-detector list-cameras`)
device = 0
# Size of the frames fed to the model
width = 400
height = 400
fps = 30
# Mirror horizontally (selfie mode)
mirror = true

[detector]
# Inference ticks per second
refresh_rate = 60

[ui]
# Language: en, th
locale = "en"
# Highlight predictions scoring above this
highlight_threshold = 0.6
# Show an ASCII preview of the camera
preview = true
# Only list the best N predictions
# max_predictions = 2
"#;
