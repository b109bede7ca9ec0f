//! Cloneable control surface for a running detector.

use tokio::sync::{mpsc, watch};

use super::state::{DetectorSnapshot, RunState};
use super::token::LoopToken;

/// Requests the presentation and environment can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCommand {
    Start,
    Stop,
    /// The app moved to (`true`) or back from (`false`) the background.
    Visibility { hidden: bool },
    /// Release everything and shut the detector down.
    Teardown,
}

/// Handle used by the UI, signal handlers and lifecycle hooks.
///
/// Every stop path disarms the loop token right away; the detector applies
/// the rest of the stop sequence when it next reads its command queue.
#[derive(Debug, Clone)]
pub struct DetectorHandle {
    tx: mpsc::UnboundedSender<DetectorCommand>,
    token: LoopToken,
    snapshot: watch::Receiver<DetectorSnapshot>,
}

impl DetectorHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<DetectorCommand>,
        token: LoopToken,
        snapshot: watch::Receiver<DetectorSnapshot>,
    ) -> Self {
        Self {
            tx,
            token,
            snapshot,
        }
    }

    pub fn start(&self) {
        self.send(DetectorCommand::Start);
    }

    pub fn stop(&self) {
        self.token.disarm();
        self.send(DetectorCommand::Stop);
    }

    /// Start when stopped, stop when running. Ignored while the control is
    /// disabled (loading, or the model failed).
    pub fn toggle(&self) {
        let snapshot = self.snapshot();
        match snapshot.state {
            RunState::Running => self.stop(),
            _ if snapshot.start_enabled() => self.start(),
            state => log::debug!("Toggle ignored in state {}", state),
        }
    }

    pub fn set_hidden(&self, hidden: bool) {
        if hidden {
            self.token.disarm();
        }
        self.send(DetectorCommand::Visibility { hidden });
    }

    pub fn teardown(&self) {
        self.token.disarm();
        self.send(DetectorCommand::Teardown);
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> DetectorSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<DetectorSnapshot> {
        self.snapshot.clone()
    }

    fn send(&self, command: DetectorCommand) {
        if self.tx.send(command).is_err() {
            log::debug!("Detector has shut down; dropping {:?}", command);
        }
    }
}
