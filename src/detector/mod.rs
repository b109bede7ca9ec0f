//! The detector: model lifecycle, camera session, and the inference loop.
//!
//! A [`Detector`] owns all mutable state (run state, loop token, capture
//! session, model handle) and is driven from a single task by
//! [`Detector::run`]. Everything else talks to it through a
//! [`DetectorHandle`] and observes it through [`DetectorSnapshot`]s.

mod clock;
mod driver;
mod handle;
mod inference;
mod lifecycle;
mod session;
mod state;
mod token;

#[cfg(test)]
mod fakes;

use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::camera::{CameraError, CameraSettings, CaptureProvider};
use crate::model::{Classifier, ModelError};

pub use clock::{RefreshClock, MAX_REFRESH_RATE};
pub use handle::{DetectorCommand, DetectorHandle};
pub use inference::TickOutcome;
pub use session::CaptureSession;
pub use state::{DetectorSnapshot, Notice, RunState};
pub use token::LoopToken;

/// Errors raised inside the detector.
///
/// Only `ModelLoad` and `CameraAccess` ever reach the presentation (as a
/// [`Notice`]); `Frame` and `Inference` stop the loop quietly.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Model failed to load: {0}")]
    ModelLoad(#[source] ModelError),
    #[error("Camera unavailable: {0}")]
    CameraAccess(#[source] CameraError),
    #[error("Frame capture failed: {0}")]
    Frame(#[source] CameraError),
    #[error("Inference failed: {0}")]
    Inference(#[source] ModelError),
    #[error("Cannot start while {0}")]
    NotReady(RunState),
}

/// Why the loop was brought down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    Hidden,
    Teardown,
    LoopFailure,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::User => "user request",
            StopReason::Hidden => "app hidden",
            StopReason::Teardown => "teardown",
            StopReason::LoopFailure => "loop failure",
        })
    }
}

/// The single detector instance.
pub struct Detector {
    state: RunState,
    model: Option<Arc<dyn Classifier>>,
    session: Option<CaptureSession>,
    token: LoopToken,
    provider: Arc<dyn CaptureProvider>,
    settings: CameraSettings,
    publisher: watch::Sender<DetectorSnapshot>,
    tx: Option<mpsc::UnboundedSender<DetectorCommand>>,
    commands: Option<mpsc::UnboundedReceiver<DetectorCommand>>,
    torn_down: bool,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("token", &self.token)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Detector {
    pub fn new(provider: Arc<dyn CaptureProvider>, settings: CameraSettings) -> Self {
        let (publisher, _) = watch::channel(DetectorSnapshot::default());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: RunState::Idle,
            model: None,
            session: None,
            token: LoopToken::new(),
            provider,
            settings,
            publisher,
            tx: Some(tx),
            commands: Some(rx),
            torn_down: false,
        }
    }

    /// Mint a control handle. Handles must be created before `run()`; once
    /// every handle is dropped the running detector tears itself down.
    pub fn handle(&self) -> DetectorHandle {
        let tx = match &self.tx {
            Some(tx) => tx.clone(),
            None => mpsc::unbounded_channel().0,
        };
        DetectorHandle::new(tx, self.token.clone(), self.publisher.subscribe())
    }

    pub fn subscribe(&self) -> watch::Receiver<DetectorSnapshot> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn token(&self) -> &LoopToken {
        &self.token
    }

    /// The scheduling invariant: only while running, with a live session
    /// and an armed token.
    pub fn can_schedule(&self) -> bool {
        self.state == RunState::Running && self.session.is_some() && self.token.is_armed()
    }

    /// Running with a session open, whether or not the token has been
    /// disarmed yet.
    pub fn loop_active(&self) -> bool {
        self.state == RunState::Running && self.session.is_some()
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            log::debug!("Run state {} -> {}", self.state, state);
            self.state = state;
        }
        self.publisher.send_if_modified(|snap| {
            let changed = snap.state != state;
            snap.state = state;
            changed
        });
    }

    fn publish(&self, update: impl FnOnce(&mut DetectorSnapshot)) {
        self.publisher.send_modify(update);
    }
}
