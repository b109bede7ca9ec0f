//! Observable detector state.

use std::fmt;
use std::sync::Arc;

use crate::camera::Frame;
use crate::model::Prediction;

/// Top-level mode of the detector. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// The model is being loaded.
    Loading,
    /// Model ready, camera off. The only state a start is accepted in.
    ReadyStopped,
    /// Camera streaming and the inference loop is live.
    Running,
    /// The model failed to load. Terminal for the session.
    Error,
}

impl RunState {
    pub fn can_start(self) -> bool {
        self == RunState::ReadyStopped
    }

    pub fn name(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Loading => "loading",
            RunState::ReadyStopped => "ready",
            RunState::Running => "running",
            RunState::Error => "error",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-facing error conditions. Frame and inference failures are never
/// surfaced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Model or metadata missing/unreadable. Start stays disabled.
    ModelLoad,
    /// Camera permission denied or no device. Start may be retried.
    CameraAccess,
}

/// Everything the presentation layer needs, published after every change.
#[derive(Debug, Clone, Default)]
pub struct DetectorSnapshot {
    pub state: RunState,
    /// Latest prediction set, in model order. Empty unless running.
    pub predictions: Vec<Prediction>,
    pub notice: Option<Notice>,
    /// The frame the current predictions were computed from. Detached
    /// (`None`) whenever the capture session is released.
    pub preview: Option<Arc<Frame>>,
    /// Set when the loop stopped itself after a frame or inference failure.
    /// Cleared by the next start.
    pub loop_halted: bool,
    /// Number of prediction sets published so far.
    pub generation: u64,
}

impl DetectorSnapshot {
    /// Whether the start control should be enabled.
    pub fn start_enabled(&self) -> bool {
        self.state.can_start() || self.state == RunState::Running
    }
}
