//! Starting the camera and running one inference iteration.

use std::sync::Arc;

use super::session::CaptureSession;
use super::state::{Notice, RunState};
use super::{Detector, DetectorError, StopReason};

/// What a single [`Detector::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Predictions were published and the loop may continue.
    Published,
    /// The camera has not produced a frame yet; nothing was classified.
    NoFrame,
    /// The loop token was disarmed: at entry (nothing touched) or while
    /// `predict` was in flight (its result was still published once).
    Cancelled,
    /// Frame capture or inference failed and the loop was brought down.
    Failed,
}

impl Detector {
    /// Open the camera and enter `Running`.
    ///
    /// Only accepted in `ReadyStopped`. A camera that cannot be bound
    /// leaves the detector in `ReadyStopped` with a `CameraAccess` notice;
    /// starting again is allowed.
    pub async fn start(&mut self) -> Result<(), DetectorError> {
        match self.state {
            RunState::ReadyStopped => {}
            RunState::Running => {
                log::debug!("Start ignored: already running");
                return Ok(());
            }
            other => return Err(DetectorError::NotReady(other)),
        }
        if self.model.is_none() {
            return Err(DetectorError::NotReady(self.state));
        }
        if let Some(stale) = self.session.take() {
            log::warn!("Releasing stale capture session before start");
            stale.release();
        }

        let source = self.provider.create(&self.settings);
        match CaptureSession::open(source).await {
            Ok(session) => {
                log::info!(
                    "Camera {} started ({}, mirror={})",
                    self.settings.device_index,
                    self.settings.resolution,
                    self.settings.mirror
                );
                self.session = Some(session);
                self.token.arm();
                self.publish(|snap| {
                    snap.notice = None;
                    snap.loop_halted = false;
                    snap.predictions.clear();
                    snap.preview = None;
                });
                self.set_state(RunState::Running);
                Ok(())
            }
            Err(e) => {
                log::error!("Error starting camera: {}", e);
                self.publish(|snap| snap.notice = Some(Notice::CameraAccess));
                Err(DetectorError::CameraAccess(e))
            }
        }
    }

    /// Run one iteration of the inference loop.
    ///
    /// Checks the loop token, pulls a frame, awaits the prediction and
    /// publishes it. Errors never escape: they are logged and the loop is
    /// stopped (camera released, state back to `ReadyStopped`).
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.token.is_armed() || self.state != RunState::Running {
            return TickOutcome::Cancelled;
        }
        let Some(model) = self.model.clone() else {
            return TickOutcome::Cancelled;
        };
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Cancelled;
        };

        let frame = match session.refresh() {
            Ok(Some(frame)) => frame,
            Ok(None) => return TickOutcome::NoFrame,
            Err(e) => {
                self.fail_loop(DetectorError::Frame(e));
                return TickOutcome::Failed;
            }
        };

        match model.predict(Arc::clone(&frame)).await {
            Ok(predictions) => {
                log::trace!("Published {} predictions", predictions.len());
                self.publish(|snap| {
                    snap.predictions = predictions;
                    snap.preview = Some(frame);
                    snap.generation += 1;
                });
            }
            Err(e) => {
                self.fail_loop(DetectorError::Inference(e));
                return TickOutcome::Failed;
            }
        }

        if self.token.is_armed() {
            TickOutcome::Published
        } else {
            TickOutcome::Cancelled
        }
    }

    fn fail_loop(&mut self, error: DetectorError) {
        log::warn!("Prediction loop stopped: {}", error);
        self.halt(StopReason::LoopFailure);
    }
}
