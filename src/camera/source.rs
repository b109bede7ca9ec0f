//! The capture contract the detector drives.

use std::sync::Arc;

use super::capture::CameraCapture;
use super::types::{CameraError, CameraSettings, Frame};

/// A camera-like frame source.
///
/// Lifecycle: `setup` binds the device, `start` begins streaming into the
/// source's frame buffer, `refresh_frame` pulls the newest frame once per
/// inference cycle, and `stop` releases the device.
pub trait CaptureSource: Send {
    /// Request the device binding.
    ///
    /// # Errors
    /// `PermissionDenied`, `NoDevices` or `DeviceNotFound` when the device
    /// cannot be bound.
    fn setup(&mut self) -> Result<(), CameraError>;

    /// Begin streaming frames.
    fn start(&mut self) -> Result<(), CameraError>;

    /// Pull the most recent frame into the source's buffer and return it.
    ///
    /// `Ok(None)` means the stream is up but nothing has arrived yet.
    fn refresh_frame(&mut self) -> Result<Option<Arc<Frame>>, CameraError>;

    /// Release the device.
    ///
    /// Must be idempotent: stopping a stopped (or never started) source is a
    /// no-op and never fails.
    fn stop(&mut self);
}

/// Builds a fresh [`CaptureSource`] for every start request.
pub trait CaptureProvider: Send + Sync {
    fn create(&self, settings: &CameraSettings) -> Box<dyn CaptureSource>;
}

/// Provider backed by real cameras through nokhwa.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCameraProvider;

impl CaptureProvider for NativeCameraProvider {
    fn create(&self, settings: &CameraSettings) -> Box<dyn CaptureSource> {
        Box::new(CameraCapture::new(settings.clone()))
    }
}
