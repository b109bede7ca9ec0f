//! Stop paths: user stop, app backgrounded, teardown.
//!
//! All of them funnel into `halt`, which is idempotent: a second stop finds
//! no session, an already disarmed token and nothing left to clear.

use super::state::RunState;
use super::{Detector, StopReason};

impl Detector {
    /// Explicit user stop.
    pub fn stop(&mut self) {
        self.halt(StopReason::User);
    }

    /// React to the app being hidden or shown.
    ///
    /// Hidden while running forces the full stop sequence. Becoming visible
    /// again never resumes; the user has to start explicitly.
    pub fn set_visibility(&mut self, hidden: bool) {
        if !hidden {
            log::debug!("App visible again (state {})", self.state);
            return;
        }
        if self.state == RunState::Running {
            self.halt(StopReason::Hidden);
        } else {
            log::debug!("App hidden while {}; nothing to stop", self.state);
        }
    }

    /// Release everything regardless of state. The driver exits afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.halt(StopReason::Teardown);
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// The shared stop sequence: disarm, release the camera, clear the
    /// predictions, detach the preview, and fall back to `ReadyStopped`.
    pub(super) fn halt(&mut self, reason: StopReason) {
        self.token.disarm();

        let had_session = match self.session.take() {
            Some(session) => {
                session.release();
                true
            }
            None => false,
        };

        let was_running = self.state == RunState::Running;
        let failed = reason == StopReason::LoopFailure;
        self.publisher.send_if_modified(|snap| {
            let changed =
                !snap.predictions.is_empty() || snap.preview.is_some() || (failed && !snap.loop_halted);
            snap.predictions.clear();
            snap.preview = None;
            snap.loop_halted |= failed;
            changed
        });
        if was_running {
            self.set_state(RunState::ReadyStopped);
        }

        if had_session || was_running {
            log::info!("Detector stopped ({})", reason);
        } else {
            log::debug!("Stop ({}) with nothing running", reason);
        }
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.halt(StopReason::Teardown);
        }
    }
}
