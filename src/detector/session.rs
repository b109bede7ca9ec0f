//! Scoped ownership of an open camera.

use std::sync::Arc;

use crate::camera::{CameraError, CaptureSource, Frame};

/// An open capture source plus the frame it last produced.
///
/// The device is released exactly once: through `release()`, or on drop
/// if nothing released it first.
pub struct CaptureSession {
    source: Box<dyn CaptureSource>,
    frame: Option<Arc<Frame>>,
    released: bool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("has_frame", &self.frame.is_some())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Run `setup()` then `start()` on a blocking thread.
    ///
    /// If `start()` fails after a successful `setup()` the source is
    /// stopped before the error is returned.
    pub async fn open(source: Box<dyn CaptureSource>) -> Result<Self, CameraError> {
        let source = tokio::task::spawn_blocking(move || {
            let mut source = source;
            source.setup()?;
            if let Err(e) = source.start() {
                source.stop();
                return Err(e);
            }
            Ok(source)
        })
        .await
        .map_err(|e| CameraError::StreamFailed(format!("camera open task: {}", e)))??;

        Ok(Self {
            source,
            frame: None,
            released: false,
        })
    }

    /// Pull the newest frame from the source.
    pub fn refresh(&mut self) -> Result<Option<Arc<Frame>>, CameraError> {
        let frame = self.source.refresh_frame()?;
        if frame.is_some() {
            self.frame.clone_from(&frame);
        }
        Ok(frame)
    }

    /// The frame from the most recent successful refresh.
    pub fn frame(&self) -> Option<&Arc<Frame>> {
        self.frame.as_ref()
    }

    /// Stop the device and drop the frame buffer.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.frame = None;
        self.source.stop();
        log::debug!("Capture session released");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release_inner();
    }
}
